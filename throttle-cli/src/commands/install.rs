//! `macthrottle install [--force]`

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;

use throttle_core::InstallationState;
use throttle_helper::Installer;

use super::load_config;

/// Deploy and register the helper.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Reinstall even if the installed helper is already current.
    #[arg(long)]
    pub force: bool,
}

impl InstallArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        let config = load_config(explicit)?;
        let installer = Installer::from_config(config);

        let force_replace = match installer.state() {
            InstallationState::NotInstalled => false,
            InstallationState::InstalledCurrent if !self.force => {
                println!("Helper already installed and up to date.");
                return Ok(());
            }
            InstallationState::InstalledCurrent => true,
            InstallationState::InstalledStale => {
                bail!("installed helper is out of date; run 'macthrottle update' to replace it")
            }
        };

        let status = installer
            .install(force_replace)
            .context("failed to install helper")?;
        println!("✓ {status}");
        println!(
            "  Daemon '{}' writes {}",
            installer.config().label,
            installer.config().state_file.display()
        );
        Ok(())
    }
}
