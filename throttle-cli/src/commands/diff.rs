//! `macthrottle diff`: what an update would change on disk.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use throttle_helper::diff_installed;

use super::load_config;

#[derive(Args, Debug)]
pub struct DiffArgs {}

impl DiffArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        let config = load_config(explicit)?;
        let diffs = diff_installed(&config);

        if diffs.is_empty() {
            println!("No differences for '{}'.", config.label);
            return Ok(());
        }

        for diff in diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }
        Ok(())
    }
}
