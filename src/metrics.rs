//! Prometheus metrics registry and metric definitions.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::errors::ExportError;

/// Global registry under crate namespace
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    Registry::new_custom(Some("pathway_exporter".into()), None)
        .expect("failed to create Prometheus registry")
});

/// Store queries issued, by query kind
pub static STORE_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("store_queries_total", "Total number of store queries issued");
    let c = IntCounterVec::new(opts, &["query"]).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).expect("register store_queries_total");
    c
});

/// Users assembled into export documents
pub static USERS_EXPORTED: Lazy<IntCounter> = Lazy::new(|| {
    let opts = Opts::new("users_exported_total", "Total number of users assembled for export");
    let c = IntCounter::with_opts(opts).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).expect("register users_exported_total");
    c
});

/// Artifacts written to disk
pub static ARTIFACTS_WRITTEN: Lazy<IntCounter> = Lazy::new(|| {
    let opts = Opts::new("artifacts_written_total", "Total number of export artifacts written");
    let c = IntCounter::with_opts(opts).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).expect("register artifacts_written_total");
    c
});

/// Histogram of export document assembly durations
pub static ASSEMBLY_HISTOGRAM: Lazy<Histogram> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "assembly_duration_seconds",
        "Duration of export document assembly in seconds",
    );
    let h = Histogram::with_opts(opts).expect("histogram opts");
    REGISTRY.register(Box::new(h.clone())).expect("register assembly_duration_seconds");
    h
});

/// Count one store round-trip of the given kind.
pub fn record_query(kind: &str) {
    STORE_QUERIES.with_label_values(&[kind]).inc();
}

/// Encode all metrics as text
pub fn gather_metrics() -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let mf = REGISTRY.gather();
    encoder.encode(&mf, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
