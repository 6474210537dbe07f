//! Request-pipeline policies (C9, ambient): cross-cutting observability
//! consumed by the RPC transport, spec §4.9.
//!
//! Grounded in `server/internal/controller/interceptors/{log,metric}.go`
//! for the field/label names, expressed with the `metrics` facade and the
//! `metrics-exporter-prometheus` recorder instead of a hand-rolled
//! registry — this crate pairing has no precedent in the teacher (which
//! ships no metrics layer at all), so it is adopted from the wider
//! ecosystem the way the system prompt allows for concerns the teacher
//! doesn't cover.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::info;

/// Installs the Prometheus recorder and serves `/metrics` on `addr`.
pub fn install(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!(%addr, "metrics endpoint installed");
    Ok(())
}

/// One RPC call's observability bookkeeping, per spec §4.9:
/// - a structured log entry with {method, request, response-or-error};
/// - a counter incremented with {method, status-code-name};
/// - a histogram of end-to-end duration for successful calls, by method.
pub struct RequestRecorder {
    method: &'static str,
    start: Instant,
}

impl RequestRecorder {
    pub fn start(method: &'static str) -> Self {
        Self {
            method,
            start: Instant::now(),
        }
    }

    pub fn finish_ok(self, request: &str) {
        let elapsed = self.start.elapsed();
        info!(method = self.method, request, response = "ok", "rpc completed");
        metrics::counter!("rpc_requests_total", "method" => self.method, "status" => "ok")
            .increment(1);
        metrics::histogram!("rpc_duration_seconds", "method" => self.method)
            .record(elapsed.as_secs_f64());
    }

    pub fn finish_err(self, request: &str, status: &'static str) {
        info!(method = self.method, request, response = status, "rpc failed");
        metrics::counter!("rpc_requests_total", "method" => self.method, "status" => status)
            .increment(1);
    }
}

/// Incremented on every successful `InitSession`.
pub fn record_user_registered() {
    metrics::counter!("users_registered_total").increment(1);
}

/// Observed on every successful `CreateChat`. Negative TTLs are clamped to
/// 0 for observability only (spec §4.9); the stored TTL value is
/// unaffected.
pub fn record_chat_ttl(ttl_secs: i64) {
    let clamped = ttl_secs.max(0) as f64;
    metrics::histogram!("chat_ttl_seconds").record(clamped);
}

/// Incremented on every successful `SendMessage`, labeled by the chat's
/// textual handle.
pub fn record_message_sent(chat: &str) {
    metrics::counter!("messages_per_chat_total", "chat" => chat.to_string()).increment(1);
}
