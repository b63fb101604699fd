//! Metric sources.
//!
//! This module provides the error type shared by all `MetricSource`
//! implementations, the iostat-backed production source, and the pre-flight
//! check run once before the server starts listening.

pub mod iostat;

pub use iostat::IostatSource;

use crate::core::MetricSource;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Why a sample could not be taken.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("iowait: failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("iowait: {command} exited with {status}: {stderr}")]
    Status {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("iowait: unexpected output: {0:?}")]
    UnexpectedOutput(String),
    #[error("iowait: invalid value {value:?}: {source}")]
    InvalidValue {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("iowait: {command} did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("{0}")]
    Unavailable(String),
}

/// Takes a single sample to prove the source works before serving.
///
/// There is no retry: one failure aborts startup.
pub async fn startup_check(source: &dyn MetricSource) -> Result<f64, SourceError> {
    let value = source.sample().await?;
    info!(value, "Pre-flight sample succeeded.");
    Ok(value)
}

#[cfg(any(test, feature = "test-utils"))]
pub mod fake;
