//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the plugin using the
//! `clap` crate. They are parsed at startup and merged on top of the TOML
//! file and environment variables, so a flag always wins.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Reporter plugin exposing CPU IO wait over a Unix domain socket.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Unix socket to listen for connections on.
    #[arg(long, value_name = "PATH")]
    pub addr: Option<PathBuf>,

    /// Hostname of the host running this plugin.
    #[arg(long, value_name = "NAME")]
    pub hostname: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Program invoked to sample CPU statistics.
    #[arg(long, value_name = "PROGRAM")]
    pub iostat_command: Option<String>,

    /// Abort a sample that takes longer than this many milliseconds.
    #[arg(long, value_name = "MS")]
    pub sample_timeout_ms: Option<u64>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(addr) = &self.addr {
            dict.insert(
                "socket_path".into(),
                Value::from(addr.display().to_string()),
            );
        }

        if let Some(hostname) = &self.hostname {
            dict.insert("host_id".into(), Value::from(hostname.clone()));
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        // Nested keys need a nested dict; a dotted key would be taken literally.
        let mut source = Dict::new();
        if let Some(command) = &self.iostat_command {
            source.insert("command".into(), Value::from(command.clone()));
        }
        if let Some(timeout) = self.sample_timeout_ms {
            source.insert("timeout_ms".into(), Value::from(timeout));
        }
        if !source.is_empty() {
            dict.insert("source".into(), Value::from(source));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
