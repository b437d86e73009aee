use std::future::Future;

use chrono::Utc;

use throttle_core::{HelperConfig, PressureSnapshot};

use crate::error::{io_err, SamplerError};
use crate::sensor::{self, SampleOutcome};
use crate::snapshot::write_snapshot;

/// Sampling state carried across ticks.
#[derive(Debug)]
pub struct Sampler {
    config: HelperConfig,
    last_timestamp: Option<i64>,
}

impl Sampler {
    pub fn new(config: HelperConfig) -> Self {
        Self {
            config,
            last_timestamp: None,
        }
    }

    /// Sample once and replace the state file.
    pub async fn tick(&mut self) -> Result<PressureSnapshot, SamplerError> {
        let outcome = sensor::sample(&self.config.sensor).await;
        match &outcome {
            SampleOutcome::Reading(level) => {
                tracing::debug!(pressure = %level, "sampled thermal pressure");
            }
            SampleOutcome::Unrecognized => {
                tracing::warn!(
                    indicator = %self.config.sensor.indicator,
                    "sensor report had no recognizable pressure level"
                );
            }
            SampleOutcome::CommandFailed(reason) => {
                tracing::warn!(%reason, "sensor command failed");
            }
        }

        let timestamp = self.next_timestamp(Utc::now().timestamp());
        let snapshot = PressureSnapshot::new(outcome.level(), timestamp);
        write_snapshot(&self.config.state_file, &snapshot)?;
        Ok(snapshot)
    }

    /// Timestamps never go backwards within one sampler, even if the wall
    /// clock does.
    fn next_timestamp(&mut self, now: i64) -> i64 {
        let timestamp = self.last_timestamp.map_or(now, |prev| prev.max(now));
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}

/// Start the sampling loop and block the current thread until ctrl-c.
pub fn start_blocking(config: HelperConfig, json_logs: bool) -> Result<(), SamplerError> {
    init_tracing(json_logs);
    let runtime = build_runtime()?;
    runtime.block_on(run(config, shutdown_signal()))
}

/// Take a single sample, write it and return it.
pub fn sample_once_blocking(
    config: HelperConfig,
    json_logs: bool,
) -> Result<PressureSnapshot, SamplerError> {
    init_tracing(json_logs);
    let runtime = build_runtime()?;
    runtime.block_on(async move { Sampler::new(config).tick().await })
}

/// Sample, write, then sleep `config.interval()`, until `shutdown` resolves.
///
/// The pause starts after each write, so a slow sensor stretches the period
/// the same way it does in the generated script. A failed sample or write is
/// logged and the loop continues.
pub async fn run<F>(config: HelperConfig, shutdown: F) -> Result<(), SamplerError>
where
    F: Future<Output = ()>,
{
    let pause = config.interval();

    tracing::info!(
        state_file = %config.state_file.display(),
        interval_secs = config.interval_secs,
        sensor = %config.sensor.program,
        "sampler started"
    );

    let mut sampler = Sampler::new(config);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            result = sampler.tick() => match result {
                Ok(snapshot) => {
                    tracing::info!(
                        pressure = %snapshot.pressure,
                        timestamp = snapshot.timestamp,
                        "snapshot written"
                    );
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to write snapshot");
                }
            },
        }

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }

    tracing::info!("sampler stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received ctrl-c, shutting down sampler"),
        Err(err) => {
            // Without a signal handler the loop runs until the process is killed.
            tracing::warn!(error = %err, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime, SamplerError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    } else {
        let _ = fmt().with_env_filter(filter).with_target(false).try_init();
    }
}
