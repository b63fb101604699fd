//! Core service traits for the iowait plugin
//!
//! This module defines the trait contracts that sit between the report
//! endpoint and the outside world: where metric values come from, and what
//! time it is when a report is built.

use crate::source::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Produces one scalar sample per call.
///
/// Implementations must fail rather than return a placeholder value when the
/// underlying mechanism is unavailable or produces output of the wrong shape.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Takes a fresh sample.
    async fn sample(&self) -> Result<f64, SourceError>;
}

/// Supplies the timestamp attached to each sample.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
