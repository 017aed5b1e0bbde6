//! Metrics collection and Prometheus export.
//!
//! Installs the global `metrics` recorder and renders it for the /metrics endpoint.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;
use std::time::Instant;

pub const DB_QUERY_DURATION: &str = "healthtrack_db_query_duration_seconds";
pub const ENTRIES_LOGGED: &str = "healthtrack_entries_logged_total";
pub const SUMMARIES: &str = "healthtrack_summaries_total";
pub const LLM_TOKENS: &str = "healthtrack_llm_tokens_total";

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it again, from any thread, is a no-op.
pub fn init_metrics() -> Result<(), AppError> {
    let mut install_error = None;

    METRICS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if let Err(e) = metrics::set_global_recorder(recorder) {
            install_error = Some(e.to_string());
        }
        handle
    });

    match install_error {
        Some(e) => Err(AppError::ConfigError(anyhow::anyhow!(
            "Failed to install Prometheus recorder: {}",
            e
        ))),
        None => Ok(()),
    }
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn observe_db_query(operation: &'static str, started: Instant) {
    histogram!(DB_QUERY_DURATION, "operation" => operation).record(started.elapsed().as_secs_f64());
}

pub fn record_entry_logged() {
    counter!(ENTRIES_LOGGED).increment(1);
}

/// `outcome` is `llm`, `fallback` or `empty`.
pub fn record_summary(outcome: &'static str) {
    counter!(SUMMARIES, "outcome" => outcome).increment(1);
}

/// Token usage reported by the summary provider.
pub fn record_llm_tokens(provider: &'static str, input: Option<u32>, output: Option<u32>) {
    if let Some(input) = input {
        counter!(LLM_TOKENS, "provider" => provider, "direction" => "input")
            .increment(u64::from(input));
    }
    if let Some(output) = output {
        counter!(LLM_TOKENS, "provider" => provider, "direction" => "output")
            .increment(u64::from(output));
    }
}
