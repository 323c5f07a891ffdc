//! HTTP delivery of finished visits to the collector.
//!
//! [`HttpSink`] is a fire-and-forget [`VisitSink`]: each record is POSTed as
//! JSON on a background task. Failures are logged and never retried; the
//! state machine never learns the outcome.

use std::fmt;
use std::time::Duration;

use dwell_core::{VisitRecord, VisitSink};
use reqwest::Url;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Default request timeout for collector calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The collector endpoint was unusable.
    #[error("invalid collector endpoint: {reason}")]
    InvalidEndpoint { reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The collector answered with a non-success status.
    #[error("collector rejected visit: status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Posts visit records to a collector endpoint.
///
/// Deliveries run on the given tokio runtime. Call [`HttpSink::drain`] before
/// exiting so in-flight requests are not cut off.
pub struct HttpSink {
    http: reqwest::Client,
    endpoint: Url,
    runtime: Handle,
    in_flight: Vec<JoinHandle<()>>,
}

impl fmt::Debug for HttpSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSink")
            .field("endpoint", &self.endpoint.as_str())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl HttpSink {
    /// Creates a sink posting to `endpoint` with the given request timeout.
    pub fn new(endpoint: &str, timeout: Duration, runtime: Handle) -> Result<Self, SinkError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SinkError::ClientBuild)?;
        Self::with_client(http, endpoint, runtime)
    }

    /// Creates a sink around an existing client.
    pub fn with_client(http: reqwest::Client, endpoint: &str, runtime: Handle) -> Result<Self, SinkError> {
        let endpoint = parse_endpoint(endpoint)?;
        Ok(Self {
            http,
            endpoint,
            runtime,
            in_flight: Vec::new(),
        })
    }

    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Number of deliveries that have not finished yet.
    pub fn pending(&self) -> usize {
        self.in_flight.iter().filter(|task| !task.is_finished()).count()
    }

    /// Waits for every in-flight delivery to finish.
    pub async fn drain(&mut self) {
        for task in self.in_flight.drain(..) {
            if let Err(err) = task.await {
                tracing::warn!(%err, "delivery task aborted");
            }
        }
    }
}

impl VisitSink for HttpSink {
    fn deliver(&mut self, record: VisitRecord) {
        self.in_flight.retain(|task| !task.is_finished());

        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let task = self.runtime.spawn(async move {
            match post_visit(&http, endpoint, &record).await {
                Ok(()) => tracing::debug!(url = %record.url, "visit delivered"),
                Err(err) => tracing::warn!(%err, url = %record.url, "failed to deliver visit"),
            }
        });
        self.in_flight.push(task);
    }
}

async fn post_visit(http: &reqwest::Client, endpoint: Url, record: &VisitRecord) -> Result<(), SinkError> {
    let response = http.post(endpoint).json(record).send().await?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(SinkError::Rejected {
        status: status.as_u16(),
        body,
    })
}

fn parse_endpoint(endpoint: &str) -> Result<Url, SinkError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(SinkError::InvalidEndpoint {
            reason: "endpoint cannot be empty".to_string(),
        });
    }
    let url = Url::parse(trimmed).map_err(|err| SinkError::InvalidEndpoint {
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(SinkError::InvalidEndpoint {
            reason: format!("unsupported scheme: {scheme}"),
        }),
    }
}
