//! Library entrypoint: re‑export modules

pub mod assembler;
pub mod config;
pub mod errors;
pub mod exporter;
pub mod joiner;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod serializer;
pub mod sink;
pub mod stats;
pub mod store;
