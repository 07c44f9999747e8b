use anyhow::{Context, Result};
use async_nats::Client;
use async_nats::jetstream::{
    Context as JsContext,
    stream::{Config as StreamConfig, RetentionPolicy},
};
use async_trait::async_trait;
use bcast_core::{AuditError, AuditLogger, AuditRecord};
use bcast_telemetry::{TelemetryLabels, record_counter};
use tracing::info;

pub const DEFAULT_SUBJECT_FMT: &str = "bcast.audit.{tenant}";
const AUDIT_STREAM_NAME: &str = "BCAST_AUDIT";
const DEFAULT_TOKEN: &str = "default";

/// Publishes each audit record as JSON to a JetStream subject derived from
/// the record's tenant.
///
/// ```no_run
/// use bcast_audit::NatsAuditLogger;
///
/// # fn main() -> anyhow::Result<()> {
/// # let rt = tokio::runtime::Runtime::new()?;
/// rt.block_on(async {
///     let client = async_nats::connect("nats://127.0.0.1:4222").await?;
///     let audit = NatsAuditLogger::new(client, "bcast.audit.{tenant}").await?;
///     assert_eq!(audit.subject_for(Some("acme")), "bcast.audit.acme");
///     anyhow::Ok(())
/// })
/// # }
/// ```
#[derive(Clone)]
pub struct NatsAuditLogger {
    js: JsContext,
    subject_fmt: String,
}

impl NatsAuditLogger {
    pub async fn new(client: Client, subject_fmt: &str) -> Result<Self> {
        let js = async_nats::jetstream::new(client);
        ensure_stream(&js, subject_fmt).await?;
        Ok(Self {
            js,
            subject_fmt: subject_fmt.to_string(),
        })
    }

    pub fn subject_for(&self, tenant: Option<&str>) -> String {
        format_subject(&self.subject_fmt, tenant.unwrap_or(DEFAULT_TOKEN))
    }
}

#[async_trait]
impl AuditLogger for NatsAuditLogger {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let subject = self.subject_for(record.tenant.as_deref());
        let payload = serde_json::to_vec(record).map_err(|err| AuditError::new(err.to_string()))?;
        let ack = self
            .js
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|err| AuditError::new(format!("publish to {subject}: {err}")))?;
        ack.await
            .map_err(|err| AuditError::new(format!("ack from {subject}: {err}")))?;

        let labels = TelemetryLabels::new(record.tenant.clone())
            .with_payload_kind(record.payload_kind.as_str())
            .with_extra("status", record.status.as_str());
        record_counter("bcast_audit_published", 1, &labels);
        info!(
            subject = %subject,
            job_id = %record.job_id,
            status = record.status.as_str(),
            "audit record published"
        );
        Ok(())
    }
}

async fn ensure_stream(js: &JsContext, subject_fmt: &str) -> Result<()> {
    let cfg = StreamConfig {
        name: AUDIT_STREAM_NAME.into(),
        subjects: vec![stream_pattern(subject_fmt)],
        retention: RetentionPolicy::Limits,
        max_messages_per_subject: -1,
        max_messages: -1,
        max_bytes: -1,
        description: Some("Broadcast dispatch audit trail".into()),
        ..StreamConfig::default()
    };

    match js.get_stream(AUDIT_STREAM_NAME).await {
        Ok(_) => Ok(()),
        Err(_) => {
            js.create_stream(cfg)
                .await
                .context("create audit stream")?;
            Ok(())
        }
    }
}

/// Wildcard subject the stream listens on; every placeholder is one `*`
/// token.
pub fn stream_pattern(subject_fmt: &str) -> String {
    expand(subject_fmt, |_| "*".to_string())
}

/// Expands `{tenant}` in `fmt`. Other placeholders expand to `default` so
/// published subjects always match [`stream_pattern`].
pub fn format_subject(fmt: &str, tenant: &str) -> String {
    let tenant = subject_token(tenant);
    expand(fmt, |key| {
        if key == "tenant" {
            tenant.clone()
        } else {
            DEFAULT_TOKEN.to_string()
        }
    })
}

/// Makes `value` a single subject token: separators, wildcards and
/// whitespace become `_`.
fn subject_token(value: &str) -> String {
    let token: String = value
        .trim()
        .chars()
        .map(|c| match c {
            '.' | '*' | '>' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    if token.is_empty() {
        DEFAULT_TOKEN.to_string()
    } else {
        token
    }
}

fn expand(fmt: &str, resolve: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(fmt.len());
    let mut chars = fmt.chars();
    while let Some(ch) = chars.next() {
        if ch != '{' {
            out.push(ch);
            continue;
        }
        let key: String = chars.by_ref().take_while(|c| *c != '}').collect();
        out.push_str(&resolve(&key));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(pattern: &str, subject: &str) -> bool {
        let pattern: Vec<&str> = pattern.split('.').collect();
        let subject: Vec<&str> = subject.split('.').collect();
        pattern.len() == subject.len()
            && pattern
                .iter()
                .zip(&subject)
                .all(|(p, s)| !s.is_empty() && (*p == "*" || p == s))
    }

    #[test]
    fn subject_expands_tenant() {
        assert_eq!(format_subject(DEFAULT_SUBJECT_FMT, "acme"), "bcast.audit.acme");
        assert_eq!(stream_pattern(DEFAULT_SUBJECT_FMT), "bcast.audit.*");
    }

    #[test]
    fn unknown_placeholders_stay_inside_the_stream() {
        let fmt = "audit.{tenant}.{region}.runs";
        let subject = format_subject(fmt, "acme");
        assert_eq!(subject, "audit.acme.default.runs");
        assert_eq!(stream_pattern(fmt), "audit.*.*.runs");
        assert!(captured(&stream_pattern(fmt), &subject));
    }

    #[test]
    fn tenants_are_folded_into_one_token() {
        let subject = format_subject(DEFAULT_SUBJECT_FMT, "acme.br north>*");
        assert_eq!(subject, "bcast.audit.acme_br_north__");
        assert!(captured(&stream_pattern(DEFAULT_SUBJECT_FMT), &subject));
        assert_eq!(format_subject(DEFAULT_SUBJECT_FMT, "  "), "bcast.audit.default");
    }
}
