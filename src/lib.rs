//! iowait - a reporter plugin for host monitoring
//!
//! This library serves a single `/report` route over a Unix domain socket.
//! Each request samples CPU IO wait and answers with a report document in the
//! plugin protocol's schema.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod endpoint;
pub mod report;
pub mod server;
pub mod shutdown;
pub mod source;

// Re-export core types for convenience
pub use crate::core::*;
