//! launchd commands for the helper daemon.
//!
//! `load` / `unload` are only rendered here; they run inside the privileged
//! sequence built by [`crate::plan`]. The registration query runs directly
//! as the current user.

use std::path::Path;
use std::process::Command;

use throttle_artifacts::shell::{join, quote_path};
use throttle_core::{HelperConfig, ServiceLabel};

use crate::error::InstallError;

/// launchd domain holding system-wide daemons.
pub const SYSTEM_DOMAIN: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceManager {
    argv: Vec<String>,
}

impl ServiceManager {
    pub fn from_config(config: &HelperConfig) -> Self {
        Self {
            argv: config.service_manager.clone(),
        }
    }

    pub fn load_command(&self, descriptor: &Path) -> String {
        format!("{} load {}", join(&self.argv), quote_path(descriptor))
    }

    pub fn unload_command(&self, descriptor: &Path) -> String {
        format!("{} unload {}", join(&self.argv), quote_path(descriptor))
    }

    /// Whether launchd currently knows `label` in the system domain.
    pub fn is_registered(&self, label: &ServiceLabel) -> Result<bool, InstallError> {
        let Some((program, prefix)) = self.argv.split_first() else {
            return Err(InstallError::ServiceQuery(
                "service manager command is empty".to_string(),
            ));
        };
        let target = format!("{SYSTEM_DOMAIN}/{label}");
        let output = Command::new(program)
            .args(prefix)
            .args(["print", target.as_str()])
            .output()
            .map_err(|e| InstallError::ServiceQuery(format!("{program}: {e}")))?;

        tracing::debug!(
            label = %label,
            status = %output.status,
            "queried service registration"
        );
        Ok(output.status.success())
    }
}
