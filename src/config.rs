//! Configuration management for the iowait plugin
//!
//! This module defines the `Config` struct holding all startup settings. It
//! uses the `figment` crate to layer built-in defaults, an optional TOML file,
//! `IOWAIT_`-prefixed environment variables and command-line flags.
//!
//! The resulting value is immutable: it is built once in `main` and handed to
//! the application by value.

use crate::cli::Cli;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the plugin socket, where the host tool discovers plugins.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/scope/plugins/iowait.sock";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Filesystem path of the Unix domain socket to listen on.
    pub socket_path: PathBuf,
    /// Identifies this machine in every report.
    pub host_id: String,
    /// How samples are taken.
    pub source: SourceConfig,
}

/// Configuration for the iostat-backed metric source.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    /// Program to run for each sample.
    pub command: String,
    /// Arguments passed to `command`.
    pub args: Vec<String>,
    /// Abort a sample that takes longer than this. Unset means wait forever.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// Sources are merged in order: defaults, the TOML file named by
    /// `cli.config` (if any), environment variables, then `cli` itself.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = &cli.config {
            if !path.exists() {
                anyhow::bail!("Configuration file not found at {:?}", path);
            }
            figment = figment.merge(Toml::file(path));
        }

        let config = figment
            // e.g. IOWAIT_HOST_ID=node1, IOWAIT_SOURCE__TIMEOUT_MS=500
            .merge(Env::prefixed("IOWAIT_").split("__"))
            .merge(cli)
            .extract()
            .context("Failed to load configuration")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            host_id: gethostname::gethostname().to_string_lossy().into_owned(),
            source: SourceConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            command: "iostat".to_string(),
            args: vec!["-c".to_string()],
            timeout_ms: None,
        }
    }
}
