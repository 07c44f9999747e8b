//! Telemetry helpers for broadcast dispatch services.
//! Installs the tracing subscriber (with optional OTLP export) and wraps the
//! `metrics` facade with label handling shared by every crate.

use anyhow::Result;

mod config;
mod context;
mod recorder;
mod tracing_init;

pub use config::{TelemetryConfig, TelemetryProtocol};
pub use context::TelemetryLabels;
pub use recorder::{record_counter, record_histogram, with_common_fields};
pub use tracing_init::{exporter_enabled, init_telemetry, shutdown};

/// Installs the subscriber configured from the environment (`RUST_LOG`,
/// `LOG_FORMAT`, `ENABLE_OTEL`, `OTEL_*`).
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(
        service_name,
        env!("CARGO_PKG_VERSION"),
    ))
}
