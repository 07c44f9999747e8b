use metrics::Label;
use tracing::Span;

use crate::context::TelemetryLabels;

fn labels(labels: &TelemetryLabels) -> Vec<Label> {
    labels
        .tags()
        .into_iter()
        .map(|(key, value)| Label::new(key, value))
        .collect()
}

pub fn record_counter(name: &'static str, value: u64, tags: &TelemetryLabels) {
    metrics::counter!(name, labels(tags)).increment(value);
}

pub fn record_histogram(name: &'static str, value: f64, tags: &TelemetryLabels) {
    metrics::histogram!(name, labels(tags)).record(value);
}

/// Fills the `tenant` and `job_id` fields declared (as `Empty`) on a span.
pub fn with_common_fields(span: &Span, tenant: Option<&str>, job_id: &str) {
    if let Some(tenant) = tenant {
        span.record("tenant", tracing::field::display(tenant));
    }
    span.record("job_id", tracing::field::display(job_id));
}
