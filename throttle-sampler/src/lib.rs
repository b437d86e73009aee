//! # throttle-sampler
//!
//! In-process sampling daemon: the same classification grammar and state-file
//! format as the generated script, driven by a tokio interval loop.
//!
//! [`start_blocking`] runs until ctrl-c; [`read_snapshot`] is the tolerant
//! reader used by status displays.

pub mod classify;
mod error;
mod runtime;
pub mod sensor;
pub mod snapshot;

pub use classify::{classify, classify_report, extract_indicator};
pub use error::SamplerError;
pub use runtime::{run, sample_once_blocking, start_blocking, Sampler};
pub use sensor::{sample, SampleOutcome};
pub use snapshot::{format_age, read_snapshot, write_snapshot};
