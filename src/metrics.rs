//! Ingestion metrics.
//!
//! Counters are labelled by data source. Without an installed recorder every
//! call is a no-op, so library users and tests pay nothing.

use std::net::SocketAddr;
use tracing::{info, warn};

/// Install the Prometheus exporter when `PENSION_METRICS_ADDR` is set
pub fn init_metrics() {
    let addr_str = match std::env::var("PENSION_METRICS_ADDR") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return,
    };
    let addr: SocketAddr = match addr_str.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics addr '{}': {}", addr_str, e);
            return;
        }
    };
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed (possibly already installed): {}", e),
    }
}

/// Metrics for the ingestion controller
pub struct IngestMetrics;

impl IngestMetrics {
    pub fn run_started(source: &str) {
        ::metrics::counter!("pension_ingest_runs_total", "source" => source.to_string()).increment(1);
    }

    pub fn keys_loaded(source: &str, count: usize) {
        ::metrics::gauge!("pension_ingest_existing_keys", "source" => source.to_string()).set(count as f64);
    }

    pub fn row_error(source: &str) {
        ::metrics::counter!("pension_ingest_row_errors_total", "source" => source.to_string()).increment(1);
    }

    pub fn duplicate(source: &str) {
        ::metrics::counter!("pension_ingest_duplicates_total", "source" => source.to_string()).increment(1);
    }

    pub fn chunk_flushed(source: &str, records: usize) {
        ::metrics::counter!("pension_ingest_chunks_total", "source" => source.to_string()).increment(1);
        ::metrics::counter!("pension_ingest_inserted_total", "source" => source.to_string())
            .increment(records as u64);
    }

    pub fn flush_failed(source: &str) {
        ::metrics::counter!("pension_ingest_flush_failures_total", "source" => source.to_string()).increment(1);
    }

    pub fn run_finished(source: &str, duration_secs: f64) {
        ::metrics::histogram!("pension_ingest_run_duration_seconds", "source" => source.to_string())
            .record(duration_secs);
    }
}
