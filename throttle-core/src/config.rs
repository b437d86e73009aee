//! Helper configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.macthrottle/
//!   config.yaml   (optional: every field falls back to its default)
//! ```
//!
//! # API pattern
//!
//! Same as the rest of the workspace:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! A [`HelperConfig`] is immutable once loaded and is passed by reference to
//! every component that touches the filesystem, the service manager or the
//! elevation boundary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{ServiceLabel, ServiceRegistration};

pub const DEFAULT_LABEL: &str = "com.macthrottle.thermal-monitor";
pub const DEFAULT_SCRIPT_PATH: &str = "/usr/local/bin/mac-throttle-thermal-monitor";
pub const DEFAULT_DESCRIPTOR_DIR: &str = "/Library/LaunchDaemons";
pub const DEFAULT_STATE_FILE: &str = "/tmp/mac-throttle-thermal-state";
pub const DEFAULT_STAGING_ROOT: &str = "/tmp";
pub const DEFAULT_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_DESCRIPTOR_OWNER: &str = "root:wheel";

// ---------------------------------------------------------------------------
// 1. Config types
// ---------------------------------------------------------------------------

/// How the controller crosses the privilege boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ElevationMethod {
    /// No elevation when already root, AppleScript on macOS, sudo elsewhere.
    #[default]
    Auto,
    AppleScript,
    Sudo,
    /// Run the command sequence as the current user.
    None,
}

/// The opaque sensor-report command and how to find its indicator line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Case-insensitive marker of the line carrying the pressure level.
    pub indicator: String,
    /// Upper bound on one sensor invocation in the native sampler.
    pub timeout_secs: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            program: "powermetrics".to_string(),
            args: ["-s", "thermal", "-n", "1", "-i", "1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            indicator: "Current pressure level".to_string(),
            timeout_secs: 5,
        }
    }
}

impl SensorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Paths, label and sampling parameters shared by every component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HelperConfig {
    pub label: ServiceLabel,
    /// Installed daemon executable.
    pub script_path: PathBuf,
    /// Service-manager daemon directory; the descriptor is `<dir>/<label>.plist`.
    pub descriptor_dir: PathBuf,
    /// Snapshot file written by the daemon.
    pub state_file: PathBuf,
    /// Parent of the per-install scratch directory.
    pub staging_root: PathBuf,
    pub interval_secs: u64,
    pub sensor: SensorConfig,
    /// argv prefix for the service manager, e.g. `["launchctl"]`.
    pub service_manager: Vec<String>,
    /// `user:group` applied to the installed descriptor; `None` skips chown.
    pub descriptor_owner: Option<String>,
    pub elevation: ElevationMethod,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            label: ServiceLabel::from(DEFAULT_LABEL),
            script_path: PathBuf::from(DEFAULT_SCRIPT_PATH),
            descriptor_dir: PathBuf::from(DEFAULT_DESCRIPTOR_DIR),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            staging_root: PathBuf::from(DEFAULT_STAGING_ROOT),
            interval_secs: DEFAULT_INTERVAL_SECS,
            sensor: SensorConfig::default(),
            service_manager: vec!["launchctl".to_string()],
            descriptor_owner: Some(DEFAULT_DESCRIPTOR_OWNER.to_string()),
            elevation: ElevationMethod::Auto,
        }
    }
}

impl HelperConfig {
    /// `<descriptor_dir>/<label>.plist`: pure, no I/O.
    pub fn descriptor_path(&self) -> PathBuf {
        self.descriptor_dir.join(format!("{}.plist", self.label.0))
    }

    /// `<state_file>.tmp`, where writers stage a snapshot before the rename.
    pub fn state_tmp_path(&self) -> PathBuf {
        let mut raw = self.state_file.as_os_str().to_owned();
        raw.push(".tmp");
        PathBuf::from(raw)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// The registration the generated descriptor describes.
    pub fn registration(&self) -> ServiceRegistration {
        ServiceRegistration {
            label: self.label.clone(),
            program_path: self.script_path.clone(),
            run_at_load: true,
            keep_alive: true,
        }
    }

    /// Reject configurations that would produce an unusable descriptor or a
    /// command sequence touching relative paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let label = &self.label.0;
        if label.is_empty() {
            return Err(invalid("label", "must not be empty"));
        }
        if label.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(invalid(
                "label",
                format!("'{label}' must not contain whitespace or '/'"),
            ));
        }
        if self.interval_secs == 0 {
            return Err(invalid("interval_secs", "must be at least 1"));
        }
        if self.sensor.timeout_secs == 0 {
            return Err(invalid("sensor.timeout_secs", "must be at least 1"));
        }
        if self.sensor.program.trim().is_empty() {
            return Err(invalid("sensor.program", "must not be empty"));
        }
        if self.service_manager.is_empty() {
            return Err(invalid("service_manager", "argv prefix must not be empty"));
        }
        if let Some(owner) = &self.descriptor_owner {
            if owner.is_empty() || owner.chars().any(char::is_whitespace) {
                return Err(invalid(
                    "descriptor_owner",
                    format!("'{owner}' is not a user[:group] pair"),
                ));
            }
        }
        for (field, path) in [
            ("script_path", &self.script_path),
            ("descriptor_dir", &self.descriptor_dir),
            ("state_file", &self.state_file),
            ("staging_root", &self.staging_root),
        ] {
            if !path.is_absolute() {
                return Err(invalid(
                    field,
                    format!("'{}' must be absolute", path.display()),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// 2. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.macthrottle/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".macthrottle").join("config.yaml")
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load `<home>/.macthrottle/config.yaml`, falling back to defaults when the
/// file is absent. The result is validated.
pub fn load_at(home: &Path) -> Result<HelperConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        let config = HelperConfig::default();
        config.validate()?;
        return Ok(config);
    }
    load_from(&path)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<HelperConfig, ConfigError> {
    load_at(&home()?)
}

/// Load an explicitly named config file. Unlike [`load_at`], a missing file is
/// an error.
pub fn load_from(path: &Path) -> Result<HelperConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let config: HelperConfig = if contents.trim().is_empty() {
        HelperConfig::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?
    };
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// 4. Save
// ---------------------------------------------------------------------------

/// Write `config` to `<home>/.macthrottle/config.yaml` via `.tmp` + rename.
pub fn save_at(home: &Path, config: &HelperConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path_at(home);
    save_to(&path, config)?;
    Ok(path)
}

/// Write `config` to an explicit path via `.tmp` + rename. Invalid configs
/// are never written.
pub fn save_to(path: &Path, config: &HelperConfig) -> Result<(), ConfigError> {
    config.validate()?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
