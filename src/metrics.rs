/*!
 * # Metrics Module
 *
 * Prometheus counters for the release pipeline, note writes, debounced slots
 * and background tasks, exported in text format at `/metrics`.
 */

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};
use tracing::error;

lazy_static! {
    pub static ref RELEASE_ATTEMPTS: IntCounter = register_int_counter!(
        "purchase_order_release_attempts_total",
        "Total number of purchase order release attempts"
    )
    .expect("metric can be created");
    pub static ref RELEASE_STEP_FAILURES: IntCounterVec = register_int_counter_vec!(
        "purchase_order_release_step_failures_total",
        "Release pipeline failures by step",
        &["step"]
    )
    .expect("metric can be created");
    pub static ref NOTE_WRITES: IntCounterVec = register_int_counter_vec!(
        "note_writes_total",
        "Rich text note writes flushed to the store",
        &["table", "scope"]
    )
    .expect("metric can be created");
    pub static ref PENDING_WRITES_SUPERSEDED: IntCounterVec = register_int_counter_vec!(
        "pending_writes_superseded_total",
        "Debounced writes replaced by a newer value before flushing",
        &["slot"]
    )
    .expect("metric can be created");
    pub static ref TASKS_PROCESSED: IntCounterVec = register_int_counter_vec!(
        "background_tasks_processed_total",
        "Background tasks handled by the worker",
        &["task", "outcome"]
    )
    .expect("metric can be created");
}

/// Renders every registered metric in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

// HTTP endpoint handler for metrics
pub async fn metrics_handler() -> Response {
    match render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to export metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
