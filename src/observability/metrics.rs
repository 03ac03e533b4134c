//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_loads_total` (counter): file loads by outcome
//! - `config_saves_total` (counter): file saves by outcome
//! - `config_merge_changes_total` (counter): leaf changes applied by merges
//! - `config_snapshots_served_total` (counter): `/config/` responses
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(
            address = %addr,
            error = %e,
            "Failed to install metrics exporter"
        ),
    }
}

pub fn record_load(outcome: &'static str) {
    ::metrics::counter!("config_loads_total", "outcome" => outcome).increment(1);
}

pub fn record_save(outcome: &'static str) {
    ::metrics::counter!("config_saves_total", "outcome" => outcome).increment(1);
}

pub fn record_merge(changes: usize) {
    ::metrics::counter!("config_merge_changes_total").increment(changes as u64);
}

pub fn record_snapshot_served() {
    ::metrics::counter!("config_snapshots_served_total").increment(1);
}
