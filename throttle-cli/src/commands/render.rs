//! `macthrottle render script|descriptor`

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use throttle_artifacts::{generate_descriptor, generate_script};

use super::load_config;

#[derive(Subcommand, Debug)]
pub enum RenderCommand {
    /// Print the daemon script.
    Script,
    /// Print the launchd descriptor.
    Descriptor,
}

pub fn run(command: RenderCommand, explicit: Option<&Path>) -> Result<()> {
    let config = load_config(explicit)?;
    let content = match command {
        RenderCommand::Script => generate_script(&config),
        RenderCommand::Descriptor => generate_descriptor(&config),
    };
    print!("{content}");
    Ok(())
}
