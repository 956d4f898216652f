// ============================================================================
// PROMETHEUS METRICS
// ============================================================================

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

lazy_static! {
    // ========================================================================
    // HTTP REQUEST METRICS
    // ========================================================================

    /// Total de requests HTTP por método, endpoint y status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "endpoint", "status"]
    )
    .unwrap();

    /// Duración de requests HTTP en segundos
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "endpoint"],
        vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5]
    )
    .unwrap();

    // ========================================================================
    // TOKEN METRICS
    // ========================================================================

    /// Tokens emitidos con éxito
    pub static ref TOKENS_ISSUED_TOTAL: IntCounter = register_int_counter!(
        "qr_tokens_issued_total",
        "Total number of single-use tokens issued"
    )
    .unwrap();

    /// Validaciones por resultado: success, already_used, invalid
    pub static ref TOKEN_VALIDATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "qr_token_validations_total",
        "Total number of token validation attempts by outcome",
        &["outcome"]
    )
    .unwrap();
}

/// Helper para registrar una request HTTP completa
pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration_secs);
}

pub fn record_token_issued() {
    TOKENS_ISSUED_TOTAL.inc();
}

pub fn record_validation(outcome: &str) {
    TOKEN_VALIDATIONS_TOTAL.with_label_values(&[outcome]).inc();
}
