//! CPU IO wait sampled from `iostat -c`.
//!
//! `iostat -c` prints a banner, a blank line, a column header and one row of
//! CPU percentages:
//!
//! ```text
//! Linux 4.2.0-25-generic (a109563eab38)	04/01/16	_x86_64_(4 CPU)
//!
//! avg-cpu:  %user   %nice %system %iowait  %steal   %idle
//!            2.37    0.00    1.58    0.01    0.00   96.04
//! ```
//!
//! The fourth column of the fourth line is `%iowait`.

use crate::config::SourceConfig;
use crate::core::MetricSource;
use crate::source::SourceError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const VALUES_LINE: usize = 3;
const VALUES_COLUMNS: usize = 6;
const IOWAIT_COLUMN: usize = 3;

/// Runs an iostat-compatible command for every sample.
#[derive(Debug, Clone)]
pub struct IostatSource {
    command: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl IostatSource {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        let source = Self::new(config.command.clone(), config.args.clone());
        match config.timeout_ms {
            Some(ms) => source.with_timeout(Duration::from_millis(ms)),
            None => source,
        }
    }

    async fn run(&self) -> Result<String, SourceError> {
        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let output = command.output();

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, output)
                .await
                .map_err(|_| SourceError::Timeout {
                    command: self.command.clone(),
                    timeout,
                })?,
            None => output.await,
        }
        .map_err(|source| SourceError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(SourceError::Status {
                command: self.command.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for IostatSource {
    fn default() -> Self {
        Self::from_config(&SourceConfig::default())
    }
}

#[async_trait]
impl MetricSource for IostatSource {
    async fn sample(&self) -> Result<f64, SourceError> {
        let stdout = self.run().await?;
        let value = parse_iowait(&stdout)?;
        debug!(command = %self.command, value, "Sampled iowait.");
        Ok(value)
    }
}

/// Extracts `%iowait` from `iostat -c` output.
pub fn parse_iowait(output: &str) -> Result<f64, SourceError> {
    let line = output
        .split('\n')
        .nth(VALUES_LINE)
        .ok_or_else(|| SourceError::UnexpectedOutput(output.to_string()))?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != VALUES_COLUMNS {
        return Err(SourceError::UnexpectedOutput(output.to_string()));
    }

    let raw = fields[IOWAIT_COLUMN];
    raw.parse::<f64>().map_err(|source| SourceError::InvalidValue {
        value: raw.to_string(),
        source,
    })
}
