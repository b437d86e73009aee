//! `macthrottle sample [--once] [--json]`: in-process sampling daemon.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use throttle_sampler::{sample_once_blocking, start_blocking};

use super::load_config;

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Take one sample, write it and print it.
    #[arg(long)]
    pub once: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json: bool,
}

impl SampleArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        let config = load_config(explicit)?;

        if self.once {
            let snapshot =
                sample_once_blocking(config, self.json).context("failed to write snapshot")?;
            println!(
                "{}",
                serde_json::to_string(&snapshot).context("failed to serialize snapshot")?
            );
            return Ok(());
        }

        start_blocking(config, self.json).context("sampler exited with error")
    }
}
