//! `macthrottle uninstall`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use throttle_helper::Installer;

use super::load_config;

#[derive(Args, Debug)]
pub struct UninstallArgs {}

impl UninstallArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        let config = load_config(explicit)?;
        let installer = Installer::from_config(config);
        let status = installer.uninstall().context("failed to uninstall helper")?;
        println!("✓ {status}");
        Ok(())
    }
}
