//! # Report Endpoint
//!
//! The single HTTP route the host tool calls on a reporter plugin. Every
//! request takes a fresh sample from the configured `MetricSource` and answers
//! with a complete report document. Nothing is carried over between requests.

use crate::core::{Clock, MetricSource, SystemClock};
use crate::report::{build_report, Report};
use crate::source::SourceError;
use axum::{
    extract::{OriginalUri, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use tracing::{error, info};

pub const REPORT_ROUTE: &str = "/report";

/// Shared, read-only state behind the `/report` route.
#[derive(Clone)]
pub struct ReportEndpoint {
    host_id: Arc<str>,
    source: Arc<dyn MetricSource>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ReportEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportEndpoint")
            .field("host_id", &self.host_id)
            .finish_non_exhaustive()
    }
}

impl ReportEndpoint {
    pub fn new(host_id: impl Into<Arc<str>>, source: Arc<dyn MetricSource>) -> Self {
        Self {
            host_id: host_id.into(),
            source,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the wall clock, e.g. with a `FixedClock` in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Samples the source once and builds a report around the result.
    ///
    /// The timestamp is captured before sampling, so it marks when the request
    /// arrived rather than when the source returned.
    pub async fn report(&self) -> Result<Report, SourceError> {
        let now = self.clock.now();
        let value = self.source.sample().await?;
        Ok(build_report(&self.host_id, now, value))
    }

    /// Builds the router serving `/report` for any HTTP method.
    pub fn router(self) -> Router {
        Router::new()
            .route(REPORT_ROUTE, any(report_handler))
            .with_state(self)
    }
}

async fn report_handler(
    State(endpoint): State<ReportEndpoint>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    info!(path = %uri, "Report requested.");

    let report = match endpoint.report().await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Failed to sample metric.");
            return plain_error(e.to_string());
        }
    };

    match serde_json::to_vec(&report) {
        Ok(mut body) => {
            body.push(b'\n');
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to encode report.");
            plain_error(e.to_string())
        }
    }
}

fn plain_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{message}\n"),
    )
        .into_response()
}
