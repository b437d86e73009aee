//! `macthrottle update [--force]`

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;

use throttle_core::InstallationState;
use throttle_helper::Installer;

use super::load_config;

/// Replace an installed helper with the current artifacts.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Update even if the installed script is already current, or missing
    /// while a stale registration remains.
    #[arg(long)]
    pub force: bool,
}

impl UpdateArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        let config = load_config(explicit)?;
        let installer = Installer::from_config(config);

        let state = installer.state();
        if !state.is_installed() && !self.force {
            bail!(
                "helper is not installed; run 'macthrottle install' first \
                 (or 'macthrottle update --force' to replace a leftover registration)"
            );
        }
        if state == InstallationState::InstalledCurrent && !self.force {
            println!("Helper already up to date.");
            return Ok(());
        }

        let status = installer.install(true).context("failed to update helper")?;
        println!("✓ {status}");
        Ok(())
    }
}
