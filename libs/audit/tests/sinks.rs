use bcast_audit::{AuditSinkConfig, JsonlAuditLogger, TracingAuditLogger};
use bcast_core::{AuditLogger, AuditRecord, AuditStatus, PayloadKind, PayloadSnapshot};
use time::OffsetDateTime;
use tracing_test::traced_test;
use uuid::Uuid;

fn record(job_id: &str, status: AuditStatus) -> AuditRecord {
    let now = OffsetDateTime::now_utc();
    AuditRecord {
        id: Uuid::new_v4(),
        job_id: job_id.into(),
        tenant: Some("acme".into()),
        targeted: 5,
        success: 2,
        failure: 0,
        status,
        started_at: now,
        completed_at: now,
        duration_ms: 0,
        payload_kind: PayloadKind::Text,
        payload: PayloadSnapshot::Text {
            content: "Promo".into(),
        },
        error: None,
    }
}

#[tokio::test]
async fn jsonl_appends_one_record_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("audit.jsonl");
    let sink = JsonlAuditLogger::new(&path);

    sink.append(&record("job-1", AuditStatus::Completed))
        .await
        .unwrap();
    sink.append(&record("job-2", AuditStatus::Cancelled))
        .await
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<AuditRecord> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].job_id, "job-1");
    assert_eq!(lines[1].status, AuditStatus::Cancelled);
    assert_eq!(lines[1].targeted, 5);
}

#[tokio::test]
async fn jsonl_reports_unwritable_paths() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be opened for appending.
    let sink = JsonlAuditLogger::new(dir.path());
    let err = sink
        .append(&record("job-1", AuditStatus::Completed))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("audit append failed"));
}

#[tokio::test]
#[traced_test]
async fn tracing_sink_logs_the_summary() {
    TracingAuditLogger
        .append(&record("job-9", AuditStatus::Completed))
        .await
        .unwrap();
    assert!(logs_contain("dispatch audit"));
    assert!(logs_contain("job-9"));
}

#[tokio::test]
async fn log_sink_needs_no_connection() {
    let sink = AuditSinkConfig::Log.connect().await.unwrap();
    sink.append(&record("job-3", AuditStatus::Error)).await.unwrap();
}
