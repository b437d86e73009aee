//! Privileged command sequences as explicit, ordered steps.
//!
//! A plan renders to one `/bin/sh` command line so it can be handed to the
//! elevation boundary in a single request. Required steps are chained with
//! `&&` (fail fast); best-effort steps are wrapped in a group whose status is
//! always zero. After each step completes its name is appended to a journal
//! file, which lets the caller tell exactly which step failed.
//!
//! Rendered install sequence (update, default config):
//!
//! ```text
//! { { launchctl unload <plist>; } 2>/dev/null; printf '%s\n' deregister >> <journal>; }
//!   && mkdir -p /usr/local/bin && cp <staged script> <script> && chmod 755 <script>
//!   && printf '%s\n' deploy-script >> <journal>
//!   && mkdir -p /Library/LaunchDaemons && cp <staged plist> <plist> && chmod 644 <plist>
//!   && chown root:wheel <plist> && printf '%s\n' deploy-descriptor >> <journal>
//!   && launchctl load <plist> && printf '%s\n' register >> <journal>
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use throttle_artifacts::shell::{quote, quote_path};
use throttle_core::HelperConfig;

use crate::service::ServiceManager;

pub const SCRIPT_MODE: &str = "755";
pub const DESCRIPTOR_MODE: &str = "644";

/// One unit of privileged work, named in the journal and in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Unload the existing registration (best effort).
    Deregister,
    /// Copy the script into place and make it executable.
    DeployScript,
    /// Copy the descriptor into place, restrict its mode, set ownership.
    DeployDescriptor,
    /// Load the descriptor into the service manager.
    Register,
    /// Remove descriptor, script and state file.
    RemoveArtifacts,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Deregister => "deregister",
            Step::DeployScript => "deploy-script",
            Step::DeployDescriptor => "deploy-descriptor",
            Step::Register => "register",
            Step::RemoveArtifacts => "remove-artifacts",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "deregister" => Ok(Step::Deregister),
            "deploy-script" => Ok(Step::DeployScript),
            "deploy-descriptor" => Ok(Step::DeployDescriptor),
            "register" => Ok(Step::Register),
            "remove-artifacts" => Ok(Step::RemoveArtifacts),
            other => Err(format!("unknown step '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub step: Step,
    /// Shell commands run in order; the step fails at the first failure.
    pub commands: Vec<String>,
    /// Failures are ignored and the step always counts as completed.
    pub best_effort: bool,
}

/// The single shell command line sent across the elevation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSequence(String);

impl CommandSequence {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for CommandSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered privileged steps for one elevation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<PlannedStep>,
}

impl Plan {
    /// Install (or, with `force_replace`, update) from staged copies.
    pub fn install(
        config: &HelperConfig,
        staged_script: &Path,
        staged_descriptor: &Path,
        force_replace: bool,
    ) -> Self {
        let services = ServiceManager::from_config(config);
        let script = &config.script_path;
        let descriptor = config.descriptor_path();
        let mut steps = Vec::new();

        if force_replace {
            steps.push(PlannedStep {
                step: Step::Deregister,
                commands: vec![services.unload_command(&descriptor)],
                best_effort: true,
            });
        }

        let mut deploy_script = Vec::new();
        if let Some(dir) = script.parent() {
            deploy_script.push(format!("mkdir -p {}", quote_path(dir)));
        }
        deploy_script.push(format!(
            "cp {} {}",
            quote_path(staged_script),
            quote_path(script)
        ));
        deploy_script.push(format!("chmod {SCRIPT_MODE} {}", quote_path(script)));
        steps.push(PlannedStep {
            step: Step::DeployScript,
            commands: deploy_script,
            best_effort: false,
        });

        let mut deploy_descriptor = Vec::new();
        if let Some(dir) = descriptor.parent() {
            deploy_descriptor.push(format!("mkdir -p {}", quote_path(dir)));
        }
        deploy_descriptor.push(format!(
            "cp {} {}",
            quote_path(staged_descriptor),
            quote_path(&descriptor)
        ));
        deploy_descriptor.push(format!(
            "chmod {DESCRIPTOR_MODE} {}",
            quote_path(&descriptor)
        ));
        if let Some(owner) = &config.descriptor_owner {
            deploy_descriptor.push(format!(
                "chown {} {}",
                quote(owner),
                quote_path(&descriptor)
            ));
        }
        steps.push(PlannedStep {
            step: Step::DeployDescriptor,
            commands: deploy_descriptor,
            best_effort: false,
        });

        steps.push(PlannedStep {
            step: Step::Register,
            commands: vec![services.load_command(&descriptor)],
            best_effort: false,
        });

        Self { steps }
    }

    /// Deregister (best effort) and remove every artifact unconditionally.
    pub fn uninstall(config: &HelperConfig) -> Self {
        let services = ServiceManager::from_config(config);
        let descriptor = config.descriptor_path();
        Self {
            steps: vec![
                PlannedStep {
                    step: Step::Deregister,
                    commands: vec![services.unload_command(&descriptor)],
                    best_effort: true,
                },
                PlannedStep {
                    step: Step::RemoveArtifacts,
                    commands: vec![format!(
                        "rm -f {} {} {} {}",
                        quote_path(&descriptor),
                        quote_path(&config.script_path),
                        quote_path(&config.state_file),
                        quote_path(&config.state_tmp_path())
                    )],
                    best_effort: false,
                },
            ],
        }
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<Step> {
        self.steps.iter().map(|s| s.step).collect()
    }

    /// First step the journal does not list, i.e. the one that failed.
    pub fn first_incomplete(&self, completed: &[Step]) -> Option<Step> {
        self.steps
            .iter()
            .map(|s| s.step)
            .find(|step| !completed.contains(step))
    }

    /// Blamed when the journal lists every step but the sequence still
    /// reported failure.
    pub fn final_step(&self) -> Step {
        self.steps
            .last()
            .map_or(Step::RemoveArtifacts, |planned| planned.step)
    }

    /// Render the plan as one fail-fast `/bin/sh` command line.
    pub fn render(&self, journal: &Path) -> CommandSequence {
        let journal = quote_path(journal);
        let segments: Vec<String> = self
            .steps
            .iter()
            .map(|planned| {
                let mark = format!("printf '%s\\n' {} >> {journal}", planned.step);
                let body = planned.commands.join(" && ");
                if planned.best_effort {
                    format!("{{ {{ {body}; }} 2>/dev/null; {mark}; }}")
                } else {
                    format!("{body} && {mark}")
                }
            })
            .collect();
        CommandSequence(segments.join(" && "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn staged() -> (PathBuf, PathBuf) {
        (
            PathBuf::from("/tmp/macthrottle-x/script"),
            PathBuf::from("/tmp/macthrottle-x/descriptor.plist"),
        )
    }

    #[test]
    fn fresh_install_has_no_deregister_step() {
        let (script, plist) = staged();
        let plan = Plan::install(&HelperConfig::default(), &script, &plist, false);
        assert_eq!(
            plan.step_names(),
            vec![Step::DeployScript, Step::DeployDescriptor, Step::Register]
        );
    }

    #[test]
    fn update_deregisters_first() {
        let (script, plist) = staged();
        let plan = Plan::install(&HelperConfig::default(), &script, &plist, true);
        assert_eq!(plan.step_names()[0], Step::Deregister);
        assert!(plan.steps()[0].best_effort);
        assert_eq!(plan.steps().len(), 4);
    }

    #[test]
    fn rendered_update_matches_expected_command_line() {
        let (script, plist) = staged();
        let plan = Plan::install(&HelperConfig::default(), &script, &plist, true);
        let rendered = plan.render(Path::new("/tmp/macthrottle-x/journal"));
        let expected = concat!(
            "{ { launchctl unload /Library/LaunchDaemons/com.macthrottle.thermal-monitor.plist; } 2>/dev/null; ",
            "printf '%s\\n' deregister >> /tmp/macthrottle-x/journal; } && ",
            "mkdir -p /usr/local/bin && ",
            "cp /tmp/macthrottle-x/script /usr/local/bin/mac-throttle-thermal-monitor && ",
            "chmod 755 /usr/local/bin/mac-throttle-thermal-monitor && ",
            "printf '%s\\n' deploy-script >> /tmp/macthrottle-x/journal && ",
            "mkdir -p /Library/LaunchDaemons && ",
            "cp /tmp/macthrottle-x/descriptor.plist /Library/LaunchDaemons/com.macthrottle.thermal-monitor.plist && ",
            "chmod 644 /Library/LaunchDaemons/com.macthrottle.thermal-monitor.plist && ",
            "chown root:wheel /Library/LaunchDaemons/com.macthrottle.thermal-monitor.plist && ",
            "printf '%s\\n' deploy-descriptor >> /tmp/macthrottle-x/journal && ",
            "launchctl load /Library/LaunchDaemons/com.macthrottle.thermal-monitor.plist && ",
            "printf '%s\\n' register >> /tmp/macthrottle-x/journal",
        );
        assert_eq!(rendered.as_str(), expected);
    }

    #[test]
    fn uninstall_removes_every_artifact_path() {
        let plan = Plan::uninstall(&HelperConfig::default());
        assert_eq!(plan.step_names(), vec![Step::Deregister, Step::RemoveArtifacts]);
        let rendered = plan.render(Path::new("/tmp/j")).to_string();
        assert!(rendered.contains(
            "rm -f /Library/LaunchDaemons/com.macthrottle.thermal-monitor.plist \
             /usr/local/bin/mac-throttle-thermal-monitor /tmp/mac-throttle-thermal-state \
             /tmp/mac-throttle-thermal-state.tmp"
        ));
    }

    #[test]
    fn chown_is_skipped_without_owner() {
        let (script, plist) = staged();
        let config = HelperConfig {
            descriptor_owner: None,
            ..HelperConfig::default()
        };
        let rendered = Plan::install(&config, &script, &plist, false)
            .render(Path::new("/tmp/j"))
            .to_string();
        assert!(!rendered.contains("chown"));
    }

    #[test]
    fn first_incomplete_follows_plan_order() {
        let (script, plist) = staged();
        let plan = Plan::install(&HelperConfig::default(), &script, &plist, true);
        assert_eq!(plan.first_incomplete(&[]), Some(Step::Deregister));
        assert_eq!(
            plan.first_incomplete(&[Step::Deregister, Step::DeployScript]),
            Some(Step::DeployDescriptor)
        );
        assert_eq!(plan.first_incomplete(&plan.step_names()), None);
    }

    #[test]
    fn step_names_round_trip_through_journal_text() {
        for step in [
            Step::Deregister,
            Step::DeployScript,
            Step::DeployDescriptor,
            Step::Register,
            Step::RemoveArtifacts,
        ] {
            assert_eq!(step.as_str().parse::<Step>(), Ok(step));
        }
        assert!("reboot".parse::<Step>().is_err());
    }
}
