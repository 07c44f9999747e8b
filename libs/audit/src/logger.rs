use async_trait::async_trait;
use bcast_core::{AuditError, AuditLogger, AuditRecord};
use tracing::info;

/// Emits the audit record as a structured log event and keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let payload = serde_json::to_string(&record.payload).unwrap_or_default();
        info!(
            target: "bcast::audit",
            audit_id = %record.id,
            job_id = %record.job_id,
            tenant = record.tenant.as_deref().unwrap_or("default"),
            status = record.status.as_str(),
            targeted = record.targeted,
            success = record.success,
            failure = record.failure,
            duration_ms = record.duration_ms,
            payload_kind = record.payload_kind.as_str(),
            payload = %payload,
            error = record.error.as_deref(),
            "dispatch audit"
        );
        Ok(())
    }
}
