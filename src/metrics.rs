use axum::{http::StatusCode, response::IntoResponse};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::{sync::OnceLock, time::Duration};
use tracing::warn;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Safe to call more than once.
pub fn init_metrics() {
    if PROMETHEUS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle);

            // Initialize metrics with zero values
            counter!("whois_requests_total", "type" => "domain").absolute(0);
            counter!("whois_requests_total", "type" => "ip").absolute(0);
            counter!("whois_errors_total", "error_type" => "unknown").absolute(0);
            counter!("whois_dns_errors_total").absolute(0);
            histogram!("whois_request_duration_seconds").record(0.0);
        }
        Err(e) => {
            warn!("Failed to install metrics recorder: {}", e);
        }
    }
}

pub fn increment_requests(query_type: &'static str) {
    counter!("whois_requests_total", "type" => query_type).increment(1);
}

pub fn increment_responses(resp_type: &'static str) {
    counter!("whois_responses_total", "resp_type" => resp_type).increment(1);
}

pub fn increment_errors(error_type: &'static str) {
    counter!("whois_errors_total", "error_type" => error_type).increment(1);
}

pub fn increment_dns_errors(count: usize) {
    counter!("whois_dns_errors_total").increment(count as u64);
}

pub fn record_query_time(elapsed: Duration) {
    histogram!("whois_request_duration_seconds").record(elapsed.as_secs_f64());
}

pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metrics not initialized".to_string()),
    }
}
