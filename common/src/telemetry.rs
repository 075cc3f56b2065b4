// Telemetry module for structured logging and store metrics

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize logging
///
/// `RUST_LOG` wins over the configured level. JSON output carries the
/// current span (including the gateway `scope_id`) on every event.
#[tracing::instrument(skip_all)]
pub fn init_logging(log_level: &str, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let layer = if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(log_level = log_level, json = json, "Logging initialized");
    Ok(())
}

/// Register descriptions for the store metrics
pub fn describe_metrics() {
    describe_counter!(
        "store_connections_opened_total",
        "Store connections opened by request-scoped gateways"
    );
    describe_counter!(
        "store_connections_closed_total",
        "Store connections closed, labelled by how the gateway let go"
    );
    describe_counter!(
        "store_connection_failures_total",
        "Failed attempts to open a store connection"
    );
    describe_counter!("store_queries_total", "Statements executed against the store");
    describe_histogram!(
        "store_query_duration_seconds",
        "Duration of individual store statements in seconds"
    );
}

#[inline]
pub fn record_connection_opened() {
    counter!("store_connections_opened_total").increment(1);
}

#[inline]
pub fn record_connection_failure() {
    counter!("store_connection_failures_total").increment(1);
}

/// `reason` is `released` for an explicit release, `dropped` otherwise
#[inline]
pub fn record_connection_closed(reason: &'static str) {
    counter!("store_connections_closed_total", "reason" => reason).increment(1);
}

#[inline]
pub fn record_query(outcome: &'static str, elapsed: Duration) {
    counter!("store_queries_total", "outcome" => outcome).increment(1);
    histogram!("store_query_duration_seconds").record(elapsed.as_secs_f64());
}
