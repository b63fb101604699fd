//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    core::{Clock, MetricSource, SystemClock},
    endpoint::ReportEndpoint,
    server::ReportServer,
    source::{startup_check, IostatSource},
};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument};

/// A bound plugin, ready to serve reports.
#[derive(Debug)]
pub struct App {
    server: ReportServer,
    endpoint: ReportEndpoint,
    shutdown_rx: watch::Receiver<bool>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    pub fn socket_path(&self) -> &Path {
        self.server.path()
    }

    /// Serves reports until shutdown is signalled or the server stops.
    pub async fn run(self) -> Result<()> {
        let router = self.endpoint.router();
        self.server.run(router, self.shutdown_rx).await?;
        info!("Report server shut down.");
        Ok(())
    }
}

/// Builder for the main application.
///
/// Separates constructing the plugin's components from running it, and lets
/// tests swap the metric source and clock.
pub struct AppBuilder {
    config: Config,
    source_override: Option<Arc<dyn MetricSource>>,
    clock_override: Option<Arc<dyn Clock>>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source_override: None,
            clock_override: None,
        }
    }

    /// Overrides the metric source for testing.
    pub fn source_override(mut self, source: Arc<dyn MetricSource>) -> Self {
        self.source_override = Some(source);
        self
    }

    /// Overrides the clock for testing.
    pub fn clock_override(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock_override = Some(clock);
        self
    }

    /// Runs the pre-flight sample and binds the socket.
    ///
    /// The socket is only bound once the source has produced a value, so a
    /// failed pre-flight leaves nothing on disk. Returns `Ok(None)` when
    /// shutdown is signalled before the pre-flight sample completes.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<Option<App>> {
        let config = self.config;

        let source = self.source_override.unwrap_or_else(|| {
            Arc::new(IostatSource::from_config(&config.source)) as Arc<dyn MetricSource>
        });

        let mut startup_rx = shutdown_rx.clone();
        tokio::select! {
            biased;
            Ok(()) = startup_rx.changed() => {
                info!("Shutdown signalled during pre-flight sample; not binding.");
                return Ok(None);
            }
            result = startup_check(source.as_ref()) => {
                result.context("Pre-flight sample failed")?;
            }
        }

        let server = ReportServer::bind(&config.socket_path)?;

        let clock = self
            .clock_override
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let endpoint = ReportEndpoint::new(config.host_id, source).with_clock(clock);

        Ok(Some(App {
            server,
            endpoint,
            shutdown_rx,
        }))
    }
}
