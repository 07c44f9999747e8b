use bcast_core::{
    AuditRecord, AuditStatus, DurableStore, MessagePayload, PayloadSnapshot, is_durable_ref,
};
use bcast_telemetry::{TelemetryLabels, record_counter};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::job::DispatchJob;

const MATERIALIZE_FAILED_COUNTER: &str = "bcast_media_materialize_failed";

/// Builds the payload snapshot persisted with the audit record.
///
/// Carousel images that are not already durable are pushed through `store`;
/// a failed card keeps its original reference.
pub async fn snapshot_payload(
    payload: &MessagePayload,
    store: Option<&dyn DurableStore>,
    labels: &TelemetryLabels,
) -> PayloadSnapshot {
    let mut snapshot = PayloadSnapshot::from_payload(payload);
    let Some(store) = store else {
        return snapshot;
    };
    if let PayloadSnapshot::Carousel { cards, .. } = &mut snapshot {
        for (idx, card) in cards.iter_mut().enumerate() {
            if is_durable_ref(&card.image) {
                continue;
            }
            match store.materialize(&card.image).await {
                Ok(url) => {
                    debug!(card = idx + 1, url = %url, "carousel image materialized");
                    card.image = url;
                }
                Err(err) => {
                    warn!(
                        card = idx + 1,
                        error = %err,
                        "carousel image not materialized, keeping original reference"
                    );
                    record_counter(MATERIALIZE_FAILED_COUNTER, 1, labels);
                }
            }
        }
    }
    snapshot
}

/// Converts a terminal job into its audit record.
pub(crate) fn audit_record(
    job: &DispatchJob,
    status: AuditStatus,
    payload: PayloadSnapshot,
    error: Option<String>,
) -> AuditRecord {
    let completed_at = job.completed_at().unwrap_or_else(OffsetDateTime::now_utc);
    let started_at = job.started_at().unwrap_or(completed_at);
    let duration_ms = (completed_at - started_at).whole_milliseconds().max(0) as u64;
    AuditRecord {
        id: Uuid::new_v4(),
        job_id: job.id().to_string(),
        tenant: job.tenant().map(str::to_string),
        targeted: job.total(),
        success: job.results().success_count(),
        failure: job.results().failure_count(),
        status,
        started_at,
        completed_at,
        duration_ms,
        payload_kind: job.payload().kind(),
        payload,
        error,
    }
}
