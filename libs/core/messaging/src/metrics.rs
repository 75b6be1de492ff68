//! Ingestion metrics.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and describe the pipeline's counters.
///
/// Call once at process startup; the returned handle renders the registry for
/// a `/metrics` endpoint.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(
        "ingest_events_received_total",
        "Events pulled from the subscription"
    );
    describe_counter!(
        "ingest_events_committed_total",
        "Events persisted and committed"
    );
    describe_counter!(
        "ingest_events_failed_total",
        "Events left uncommitted after a processing failure"
    );

    Ok(handle)
}

/// Counter handles scoped to one stream/processor pair.
#[derive(Clone)]
pub struct IngestMetrics {
    stream: String,
    processor: String,
}

impl IngestMetrics {
    pub fn new(stream: impl Into<String>, processor: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            processor: processor.into(),
        }
    }

    pub fn received(&self) {
        counter!(
            "ingest_events_received_total",
            "stream" => self.stream.clone(),
            "processor" => self.processor.clone(),
        )
        .increment(1);
    }

    pub fn committed(&self) {
        counter!(
            "ingest_events_committed_total",
            "stream" => self.stream.clone(),
            "processor" => self.processor.clone(),
        )
        .increment(1);
    }

    pub fn failed(&self) {
        counter!(
            "ingest_events_failed_total",
            "stream" => self.stream.clone(),
            "processor" => self.processor.clone(),
        )
        .increment(1);
    }
}
