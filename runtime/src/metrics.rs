//! Prometheus metric registration and recorders.
//!
//! Metric families exposed by this workspace:
//!
//! - `store.*`: action dispatch, reducer latency, effect execution
//! - `dlq.*`: dead letter queue pressure
//! - `retry.*`: backoff outcomes for API reads
//! - `api_client.*`: request counts and latency per endpoint
//! - `checkout.*`: booking flow outcomes
//! - `reviews.*`: review workflow outcomes
//!
//! [`MetricsServer`] installs the global recorder once at startup and
//! keeps a [`PrometheusHandle`] so the host process can render the
//! exposition format, either behind an HTTP route at the configured
//! address or on demand:
//!
//! ```rust,no_run
//! use ghumly_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! if let Some(snapshot) = server.render() {
//!     println!("{snapshot}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Recording macros, re-exported so feature crates take one dependency
pub use metrics::{counter, gauge, histogram};

/// Histogram buckets for every `*duration_seconds` metric, from 1ms to 10s.
const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Errors from installing the metrics recorder.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Exporter configuration was rejected
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Global recorder could not be installed
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Scrape listener could not bind
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Owns the Prometheus recorder for the process.
///
/// `start()` is idempotent across instances: the first call installs the
/// global recorder, later calls (common under `cargo test`, where the
/// process is shared) log a warning and carry on without a handle.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Server that will advertise metrics for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Describe every metric family and install the global recorder.
    ///
    /// # Errors
    ///
    /// [`MetricsError::Build`] when the exporter configuration is invalid.
    /// [`MetricsError::Install`] when a different recorder is already
    /// registered (an already-installed Prometheus recorder is tolerated).
    pub fn start(&mut self) -> Result<(), MetricsError> {
        describe_all();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                DURATION_BUCKETS,
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        self.handle = install(builder)?;
        if self.handle.is_some() {
            tracing::info!(addr = %self.addr, "Prometheus recorder installed");
        }
        Ok(())
    }

    /// Handle for rendering, `None` until `start()` installed the recorder.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Current metrics in the Prometheus exposition format.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn install(builder: PrometheusBuilder) -> Result<Option<PrometheusHandle>, MetricsError> {
    match builder.install_recorder() {
        Ok(handle) => Ok(Some(handle)),
        Err(e) if e.to_string().contains("already initialized") => {
            tracing::warn!("Metrics recorder already installed, reusing it");
            Ok(None)
        }
        Err(e) => Err(MetricsError::Install(e.to_string())),
    }
}

fn describe_all() {
    describe_store();
    describe_dlq();
    describe_retry();
    describe_api_client();
    describe_checkout();
    describe_reviews();
}

fn describe_store() {
    describe_counter!("store.actions.total", "Actions processed by the store");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Reducer execution time per action"
    );
    describe_histogram!("store.effects.count", "Effects produced per action");
    describe_counter!(
        "store.effects.executed",
        "Effects started, labeled by effect type"
    );
    describe_counter!("store.effects.failed", "Effects that panicked");
    describe_histogram!(
        "store.effects.duration_seconds",
        "Future effect execution time"
    );
    describe_counter!("store.shutdown.initiated", "Graceful shutdowns begun");
    describe_counter!(
        "store.shutdown.completed",
        "Graceful shutdowns finished cleanly"
    );
    describe_counter!("store.shutdown.timeout", "Graceful shutdowns that timed out");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions refused while draining"
    );
}

fn describe_dlq() {
    describe_gauge!("dlq.size", "Entries currently in the dead letter queue");
    describe_counter!("dlq.pushed", "Entries pushed to the dead letter queue");
    describe_counter!("dlq.dropped", "Entries evicted because the queue was full");
    describe_counter!("dlq.drained", "Entries drained for inspection");
}

fn describe_retry() {
    describe_counter!("retry.attempts", "Operation attempts under a retry policy");
    describe_counter!("retry.succeeded", "Operations that recovered after retrying");
    describe_counter!("retry.exhausted", "Operations that failed every retry");
}

fn describe_api_client() {
    describe_counter!(
        "api_client.requests",
        "API requests, labeled by endpoint and outcome"
    );
    describe_histogram!(
        "api_client.request.duration_seconds",
        "API request latency, labeled by endpoint"
    );
    describe_counter!(
        "api_client.retries",
        "API read requests retried, labeled by endpoint"
    );
}

fn describe_checkout() {
    describe_counter!("checkout.orders_created", "Payment orders created");
    describe_counter!("checkout.payments_verified", "Payments verified with the backend");
    describe_counter!("checkout.payments_failed", "Payments that failed or were rejected");
    describe_counter!(
        "checkout.payments_cancelled",
        "Payments abandoned at the gateway widget"
    );
    describe_counter!(
        "checkout.double_submits_blocked",
        "Checkout starts ignored because one was already running"
    );
}

fn describe_reviews() {
    describe_counter!("reviews.submitted", "Reviews accepted by the backend");
    describe_counter!("reviews.updated", "Review edits accepted by the backend");
    describe_counter!("reviews.deleted", "Reviews removed by their author");
    describe_counter!(
        "reviews.rejected",
        "Review requests refused, client-side or by the backend"
    );
    describe_counter!(
        "reviews.double_submits_blocked",
        "Review mutations ignored because one was already in flight"
    );
}

/// Recorders for the API client.
pub struct ApiClientMetrics;

impl ApiClientMetrics {
    /// Record one completed request with its outcome label.
    pub fn record_request(endpoint: &str, outcome: &str, duration: Duration) {
        counter!(
            "api_client.requests",
            "endpoint" => endpoint.to_string(),
            "outcome" => outcome.to_string()
        )
        .increment(1);
        histogram!(
            "api_client.request.duration_seconds",
            "endpoint" => endpoint.to_string()
        )
        .record(duration.as_secs_f64());
    }

    /// Record one retried read.
    pub fn record_retry(endpoint: &str) {
        counter!("api_client.retries", "endpoint" => endpoint.to_string()).increment(1);
    }
}

/// Recorders for checkout flow outcomes.
pub struct CheckoutMetrics;

impl CheckoutMetrics {
    /// A payment order was created for a booking.
    pub fn record_order_created() {
        counter!("checkout.orders_created").increment(1);
    }

    /// A payment passed signature verification.
    pub fn record_payment_verified() {
        counter!("checkout.payments_verified").increment(1);
    }

    /// A payment failed at the gateway or verification step.
    pub fn record_payment_failed() {
        counter!("checkout.payments_failed").increment(1);
    }

    /// The customer dismissed the payment widget.
    pub fn record_payment_cancelled() {
        counter!("checkout.payments_cancelled").increment(1);
    }

    /// A `StartCheckout` was ignored because checkout was in flight.
    pub fn record_double_submit_blocked() {
        counter!("checkout.double_submits_blocked").increment(1);
    }
}

/// Recorders for review workflow outcomes.
pub struct ReviewMetrics;

impl ReviewMetrics {
    /// A review was accepted by the backend.
    pub fn record_submitted() {
        counter!("reviews.submitted").increment(1);
    }

    /// A review edit was accepted by the backend.
    pub fn record_updated() {
        counter!("reviews.updated").increment(1);
    }

    /// A review was deleted by its author.
    pub fn record_deleted() {
        counter!("reviews.deleted").increment(1);
    }

    /// A review request was refused, before or after the network.
    pub fn record_rejected() {
        counter!("reviews.rejected").increment(1);
    }

    /// A review mutation was ignored because one was already in flight.
    pub fn record_double_submit_blocked() {
        counter!("reviews.double_submits_blocked").increment(1);
    }
}
