pub mod config;
pub mod diff;
pub mod install;
pub mod render;
pub mod sample;
pub mod status;
pub mod uninstall;
pub mod update;

use std::path::Path;

use anyhow::{Context, Result};

use throttle_core::{config as helper_config, HelperConfig};

/// Load `explicit` if given, else `~/.macthrottle/config.yaml` (or defaults).
pub fn load_config(explicit: Option<&Path>) -> Result<HelperConfig> {
    match explicit {
        Some(path) => helper_config::load_from(path)
            .with_context(|| format!("failed to load config '{}'", path.display())),
        None => helper_config::load().context("failed to load ~/.macthrottle/config.yaml"),
    }
}

/// Library diagnostics on stderr; `RUST_LOG` overrides the `warn` default.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
