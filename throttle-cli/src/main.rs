//! macthrottle: lifecycle manager for the privileged thermal-pressure helper.
//!
//! # Usage
//!
//! ```text
//! macthrottle [--config <file>] install [--force]
//! macthrottle [--config <file>] update [--force]
//! macthrottle [--config <file>] uninstall
//! macthrottle [--config <file>] status [--json]
//! macthrottle [--config <file>] diff
//! macthrottle [--config <file>] render script|descriptor
//! macthrottle [--config <file>] sample [--once] [--json]
//! macthrottle [--config <file>] config show|init|path
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigCommand, diff::DiffArgs, install::InstallArgs, render::RenderCommand,
    sample::SampleArgs, status::StatusArgs, uninstall::UninstallArgs, update::UpdateArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "macthrottle",
    version,
    about = "Install, update and inspect the thermal-pressure helper daemon",
    long_about = None,
)]
struct Cli {
    /// Helper config file (default: ~/.macthrottle/config.yaml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deploy the helper script and descriptor and register the daemon.
    Install(InstallArgs),

    /// Replace an out-of-date helper with the current artifacts.
    Update(UpdateArgs),

    /// Deregister the daemon and remove every helper file.
    Uninstall(UninstallArgs),

    /// Show installation state, artifact digests and the latest snapshot.
    Status(StatusArgs),

    /// Show unified diffs between installed and current artifacts.
    Diff(DiffArgs),

    /// Print a generated artifact.
    Render {
        #[command(subcommand)]
        command: RenderCommand,
    },

    /// Run the sampling loop in the foreground.
    Sample(SampleArgs),

    /// Inspect or create the helper config file.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let explicit = cli.config.as_deref();

    // The sampler installs its own subscriber.
    if !matches!(cli.command, Commands::Sample(_)) {
        commands::init_tracing();
    }

    match cli.command {
        Commands::Install(args) => args.run(explicit),
        Commands::Update(args) => args.run(explicit),
        Commands::Uninstall(args) => args.run(explicit),
        Commands::Status(args) => args.run(explicit),
        Commands::Diff(args) => args.run(explicit),
        Commands::Render { command } => commands::render::run(command, explicit),
        Commands::Sample(args) => args.run(explicit),
        Commands::Config { command } => commands::config::run(command, explicit),
    }
}
