//! The privilege boundary.
//!
//! Everything privileged goes through [`Elevator::run_elevated`], which takes
//! one [`CommandSequence`] and blocks until it finishes. Elevation prompts can
//! wait on the operator indefinitely; no timeout is applied.

use std::process::{Command, Output, Stdio};

use throttle_core::ElevationMethod;

use crate::error::ElevationError;
use crate::plan::CommandSequence;

pub trait Elevator {
    /// Run `sequence` with elevated privileges.
    fn run_elevated(&self, sequence: &CommandSequence) -> Result<(), ElevationError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

impl<E: Elevator + ?Sized> Elevator for Box<E> {
    fn run_elevated(&self, sequence: &CommandSequence) -> Result<(), ElevationError> {
        (**self).run_elevated(sequence)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// `osascript` `do shell script … with administrator privileges` (macOS).
#[derive(Debug, Clone, Copy, Default)]
pub struct AppleScriptElevator;

impl Elevator for AppleScriptElevator {
    fn run_elevated(&self, sequence: &CommandSequence) -> Result<(), ElevationError> {
        let source = format!(
            "do shell script \"{}\" with administrator privileges",
            applescript_escape(sequence.as_str())
        );
        let mut command = Command::new("osascript");
        command.arg("-e").arg(source);
        let output = capture("osascript", command)?;
        if output.status.success() {
            return Ok(());
        }
        Err(classify_applescript_failure(&stderr_text(&output)))
    }

    fn name(&self) -> &'static str {
        "applescript"
    }
}

/// `sudo /bin/sh -c …`; the password prompt uses the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SudoElevator;

impl Elevator for SudoElevator {
    fn run_elevated(&self, sequence: &CommandSequence) -> Result<(), ElevationError> {
        let mut command = Command::new("sudo");
        command
            .args(["--", "/bin/sh", "-c"])
            .arg(sequence.as_str())
            .stdin(Stdio::inherit());
        let output = capture("sudo", command)?;
        if output.status.success() {
            return Ok(());
        }
        Err(classify_sudo_failure(&stderr_text(&output), &output))
    }

    fn name(&self) -> &'static str {
        "sudo"
    }
}

/// `/bin/sh -c …` as the current user: for callers that are already root,
/// or configurations whose paths the user can write.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectElevator;

impl Elevator for DirectElevator {
    fn run_elevated(&self, sequence: &CommandSequence) -> Result<(), ElevationError> {
        let mut command = Command::new("/bin/sh");
        command.arg("-c").arg(sequence.as_str());
        let output = capture("/bin/sh", command)?;
        if output.status.success() {
            return Ok(());
        }
        Err(ElevationError::Failed(failure_text(&output)))
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

/// Pick the elevator for `method`. `Auto` runs directly when already root,
/// uses AppleScript on macOS and sudo elsewhere.
pub fn elevator_for(method: ElevationMethod) -> Box<dyn Elevator> {
    match method {
        ElevationMethod::AppleScript => Box::new(AppleScriptElevator),
        ElevationMethod::Sudo => Box::new(SudoElevator),
        ElevationMethod::None => Box::new(DirectElevator),
        ElevationMethod::Auto => {
            if is_root() {
                Box::new(DirectElevator)
            } else if cfg!(target_os = "macos") {
                Box::new(AppleScriptElevator)
            } else {
                Box::new(SudoElevator)
            }
        }
    }
}

fn is_root() -> bool {
    Command::new("id")
        .arg("-u")
        .output()
        .map(|out| out.status.success() && String::from_utf8_lossy(&out.stdout).trim() == "0")
        .unwrap_or(false)
}

fn capture(program: &str, mut command: Command) -> Result<Output, ElevationError> {
    tracing::debug!(program, "crossing privilege boundary");
    command.output().map_err(|source| ElevationError::Spawn {
        program: program.to_string(),
        source,
    })
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn failure_text(output: &Output) -> String {
    let stderr = stderr_text(output);
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}

/// Escape for an AppleScript double-quoted string literal.
pub(crate) fn applescript_escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `-128` is "User canceled."; `-60005` is a failed administrator login.
pub(crate) fn classify_applescript_failure(stderr: &str) -> ElevationError {
    let message = stderr
        .split_once("execution error: ")
        .map(|(_, rest)| rest)
        .unwrap_or(stderr)
        .trim()
        .to_string();
    if stderr.contains("(-128)") || stderr.contains("(-60005)") {
        ElevationError::Denied(message)
    } else if message.is_empty() {
        ElevationError::Failed("osascript failed without a message".to_string())
    } else {
        ElevationError::Failed(message)
    }
}

/// sudo reports its own failures (bad password, not in sudoers) on lines
/// prefixed with `sudo:`; anything else came from the sequence.
pub(crate) fn classify_sudo_failure(stderr: &str, output: &Output) -> ElevationError {
    if stderr.lines().any(|line| line.starts_with("sudo:")) {
        ElevationError::Denied(stderr.to_string())
    } else {
        ElevationError::Failed(failure_text(output))
    }
}
