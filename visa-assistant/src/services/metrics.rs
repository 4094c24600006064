//! Prometheus metrics for the visa assistant.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Model provider metrics
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Consultation metrics
pub static CONSULTATION_TURNS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static CHECKLIST_ITEMS_ADDED_TOTAL: OnceLock<IntCounter> = OnceLock::new();
pub static CITATIONS_RETURNED_TOTAL: OnceLock<IntCounter> = OnceLock::new();

static INIT: Once = Once::new();

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "provider_latency_seconds",
            "Model provider API latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider", "model", "operation"],
    )
    .expect("Failed to create provider_latency_seconds metric");

    let provider_errors = IntCounterVec::new(
        Opts::new("provider_errors_total", "Total model provider errors"),
        &["provider", "error_type"],
    )
    .expect("Failed to create provider_errors_total metric");

    let provider_tokens = IntCounterVec::new(
        Opts::new("provider_tokens_total", "Total tokens processed"),
        &["model", "type"], // type: input, output
    )
    .expect("Failed to create provider_tokens_total metric");

    let turns = IntCounterVec::new(
        Opts::new("consultation_turns_total", "Consultation turns by outcome"),
        &["outcome"],
    )
    .expect("Failed to create consultation_turns_total metric");

    let checklist_items = IntCounter::new(
        "checklist_items_added_total",
        "Checklist items discovered in model answers",
    )
    .expect("Failed to create checklist_items_added_total metric");

    let citations = IntCounter::new(
        "citations_returned_total",
        "Deduplicated citations returned to visitors",
    )
    .expect("Failed to create citations_returned_total metric");

    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("Failed to register http_requests_total");
    registry
        .register(Box::new(http_request_duration.clone()))
        .expect("Failed to register http_request_duration_seconds");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register provider_latency_seconds");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("Failed to register provider_errors_total");
    registry
        .register(Box::new(provider_tokens.clone()))
        .expect("Failed to register provider_tokens_total");
    registry
        .register(Box::new(turns.clone()))
        .expect("Failed to register consultation_turns_total");
    registry
        .register(Box::new(checklist_items.clone()))
        .expect("Failed to register checklist_items_added_total");
    registry
        .register(Box::new(citations.clone()))
        .expect("Failed to register citations_returned_total");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_request_duration);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = PROVIDER_TOKENS_TOTAL.set(provider_tokens);
    let _ = CONSULTATION_TURNS_TOTAL.set(turns);
    let _ = CHECKLIST_ITEMS_ADDED_TOTAL.set(checklist_items);
    let _ = CITATIONS_RETURNED_TOTAL.set(citations);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: &str, duration_secs: f64) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, path, status]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, operation: &str, duration_secs: f64) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model, operation])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

/// Record token usage.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(counter) = PROVIDER_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}

/// Record a consultation turn ("answered" or "failed").
pub fn record_turn(outcome: &str) {
    if let Some(counter) = CONSULTATION_TURNS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record checklist items and citations produced by one answer.
pub fn record_answer_yield(items_added: usize, citations: usize) {
    if let Some(counter) = CHECKLIST_ITEMS_ADDED_TOTAL.get() {
        counter.inc_by(items_added as u64);
    }
    if let Some(counter) = CITATIONS_RETURNED_TOTAL.get() {
        counter.inc_by(citations as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_turns_show_up_in_exposition() {
        init_metrics();
        record_turn("answered");
        record_answer_yield(2, 1);

        let text = get_metrics();
        assert!(text.contains("consultation_turns_total"));
        assert!(text.contains("checklist_items_added_total"));
    }
}
