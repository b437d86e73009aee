//! `macthrottle config show|init|path`

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use throttle_core::{config as helper_config, HelperConfig};

use super::load_config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective config as YAML.
    Show,
    /// Write the default config file.
    Init(ConfigInitArgs),
    /// Print the config file location.
    Path,
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(command: ConfigCommand, explicit: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = load_config(explicit)?;
            print!(
                "{}",
                serde_yaml::to_string(&config).context("failed to serialize config")?
            );
        }
        ConfigCommand::Init(args) => {
            let path = config_file(explicit)?;
            if path.exists() && !args.force {
                bail!(
                    "config already exists at {}; pass --force to overwrite",
                    path.display()
                );
            }
            helper_config::save_to(&path, &HelperConfig::default())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("✓ Wrote default config to {}", path.display());
        }
        ConfigCommand::Path => {
            println!("{}", config_file(explicit)?.display());
        }
    }
    Ok(())
}

fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(helper_config::config_path_at(&home))
}
