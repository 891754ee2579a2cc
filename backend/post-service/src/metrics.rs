//! Prometheus metrics for post-service.
//!
//! Operation outcomes, notification fan-out, and asset cleanup, plus the
//! `/metrics` handler.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Post operations by name and outcome (ok or error kind).
    pub static ref POST_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_operations_total",
        "Post service operations segmented by operation and result",
        &["op", "result"]
    )
    .expect("failed to register post_operations_total");

    /// Notifications written by fan-out.
    pub static ref NOTIFICATIONS_EMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_notifications_emitted_total",
        "Notifications created as a side effect of likes and comments",
        &["kind"]
    )
    .expect("failed to register post_notifications_emitted_total");

    /// Image cleanup attempts after post deletion.
    pub static ref ASSET_CLEANUP_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_asset_cleanup_total",
        "Post image cleanup attempts segmented by result",
        &["result"]
    )
    .expect("failed to register post_asset_cleanup_total");
}

pub fn record_operation(op: &str, result: &str) {
    POST_OPERATIONS_TOTAL.with_label_values(&[op, result]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
