//! OpenTelemetry metrics.
//!
//! Key metrics:
//! - ufo_writes_total: Counter of applied/failed write commands
//! - ufo_write_queue_depth: Gauge of pending write commands
//! - ufo_backups_total: Counter of completed/failed backup cycles
//! - ufo_ingested_total: Counter of posts submitted by the poller

use opentelemetry::metrics::{Counter, Gauge, Meter};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use std::sync::OnceLock;

/// Global metrics instance.
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Outcome label for writes and backups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Failed,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Failed => "failed",
        }
    }
}

/// Collector metrics registry.
#[derive(Debug)]
pub struct Metrics {
    /// Write commands executed, by outcome.
    pub writes_total: Counter<u64>,
    /// Pending write commands at the last report.
    pub write_queue_depth: Gauge<i64>,
    /// Backup cycles, by outcome.
    pub backups_total: Counter<u64>,
    /// Posts handed to the write queue.
    pub ingested_total: Counter<u64>,
}

impl Metrics {
    fn new(meter: &Meter) -> Self {
        Self {
            writes_total: meter
                .u64_counter("ufo_writes_total")
                .with_description("Write commands executed against the datastore")
                .with_unit("1")
                .init(),
            write_queue_depth: meter
                .i64_gauge("ufo_write_queue_depth")
                .with_description("Write commands waiting in the queue")
                .with_unit("1")
                .init(),
            backups_total: meter
                .u64_counter("ufo_backups_total")
                .with_description("Datastore backup cycles")
                .with_unit("1")
                .init(),
            ingested_total: meter
                .u64_counter("ufo_ingested_total")
                .with_description("Posts submitted for persistence")
                .with_unit("1")
                .init(),
        }
    }
}

fn manual_provider() -> SdkMeterProvider {
    let reader = ManualReader::builder().build();
    SdkMeterProvider::builder().with_reader(reader).build()
}

/// Initialize the metrics system.
///
/// This should be called once at startup. Subsequent calls are ignored.
///
/// # Arguments
///
/// * `otel_endpoint` - Optional OTLP endpoint for metrics export
pub fn init_metrics_with_endpoint(otel_endpoint: Option<&str>) {
    METRICS.get_or_init(|| {
        if let Some(endpoint) = otel_endpoint {
            use opentelemetry_otlp::{Protocol, WithExportConfig};

            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_protocol(Protocol::Grpc);

            match opentelemetry_otlp::new_pipeline()
                .metrics(opentelemetry_sdk::runtime::Tokio)
                .with_exporter(exporter)
                .with_period(std::time::Duration::from_secs(10))
                .build()
            {
                Ok(provider) => {
                    global::set_meter_provider(provider);
                    tracing::info!(endpoint, "OTLP metrics exporter configured");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create OTLP exporter, using no-op metrics");
                    global::set_meter_provider(manual_provider());
                }
            }
        } else {
            // Recorded but not exported
            global::set_meter_provider(manual_provider());
        }

        let meter = global::meter("ufo-collector");
        Metrics::new(&meter)
    });
}

/// Initialize the metrics system without OTLP export.
pub fn init_metrics() {
    init_metrics_with_endpoint(None);
}

/// Get the global metrics instance, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

pub fn record_write(outcome: Outcome) {
    if let Some(m) = METRICS.get() {
        m.writes_total
            .add(1, &[KeyValue::new("outcome", outcome.as_str())]);
    }
}

pub fn record_queue_depth(depth: usize) {
    if let Some(m) = METRICS.get() {
        m.write_queue_depth
            .record(i64::try_from(depth).unwrap_or(i64::MAX), &[]);
    }
}

pub fn record_backup(outcome: Outcome) {
    if let Some(m) = METRICS.get() {
        m.backups_total
            .add(1, &[KeyValue::new("outcome", outcome.as_str())]);
    }
}

pub fn record_ingested(count: u64) {
    if let Some(m) = METRICS.get() {
        m.ingested_total.add(count, &[]);
    }
}
