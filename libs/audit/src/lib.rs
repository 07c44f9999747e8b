//! Audit trail sinks for finished dispatch runs.
//!
//! Every sink implements [`bcast_core::AuditLogger`]. [`AuditSinkConfig`]
//! picks one from the environment (`BCAST_AUDIT_SINK`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bcast_core::SharedAuditLogger;
use tracing::info;

mod jsonl;
mod logger;
mod nats;

pub use jsonl::JsonlAuditLogger;
pub use logger::TracingAuditLogger;
pub use nats::{DEFAULT_SUBJECT_FMT, NatsAuditLogger, format_subject, stream_pattern};

const SINK_ENV: &str = "BCAST_AUDIT_SINK";
const NATS_URL_ENV: &str = "NATS_URL";
const SUBJECT_FMT_ENV: &str = "BCAST_AUDIT_SUBJECT_FMT";
const DEFAULT_NATS_URL: &str = "nats://127.0.0.1:4222";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuditSinkConfig {
    #[default]
    Log,
    Jsonl(PathBuf),
    Nats { url: String, subject_fmt: String },
}

impl AuditSinkConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup(SINK_ENV).unwrap_or_else(|| "log".into());
        Self::parse(&raw, &lookup)
    }

    /// Parses `log`, `jsonl:<path>` or `nats`.
    pub fn parse<F>(raw: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("log") {
            return Ok(AuditSinkConfig::Log);
        }
        if raw.eq_ignore_ascii_case("nats") {
            return Ok(AuditSinkConfig::Nats {
                url: lookup(NATS_URL_ENV).unwrap_or_else(|| DEFAULT_NATS_URL.into()),
                subject_fmt: lookup(SUBJECT_FMT_ENV)
                    .unwrap_or_else(|| DEFAULT_SUBJECT_FMT.into()),
            });
        }
        if let Some(path) = raw.strip_prefix("jsonl:") {
            if path.trim().is_empty() {
                bail!("{SINK_ENV}=jsonl: needs a file path");
            }
            return Ok(AuditSinkConfig::Jsonl(PathBuf::from(path.trim())));
        }
        bail!("unsupported audit sink {raw:?} (expected log, jsonl:<path> or nats)")
    }

    /// Builds the sink, connecting to NATS when needed.
    pub async fn connect(&self) -> Result<SharedAuditLogger> {
        let sink: SharedAuditLogger = match self {
            AuditSinkConfig::Log => Arc::new(TracingAuditLogger),
            AuditSinkConfig::Jsonl(path) => Arc::new(JsonlAuditLogger::new(path.clone())),
            AuditSinkConfig::Nats { url, subject_fmt } => {
                let client = async_nats::connect(url.as_str())
                    .await
                    .with_context(|| format!("connect to NATS at {url}"))?;
                Arc::new(NatsAuditLogger::new(client, subject_fmt).await?)
            }
        };
        info!(sink = ?self, "audit sink ready");
        Ok(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_sink_kinds() {
        assert_eq!(AuditSinkConfig::parse("log", none).unwrap(), AuditSinkConfig::Log);
        assert_eq!(
            AuditSinkConfig::parse("jsonl:/var/log/bcast/audit.jsonl", none).unwrap(),
            AuditSinkConfig::Jsonl(PathBuf::from("/var/log/bcast/audit.jsonl"))
        );
        assert_eq!(
            AuditSinkConfig::parse("nats", none).unwrap(),
            AuditSinkConfig::Nats {
                url: DEFAULT_NATS_URL.into(),
                subject_fmt: DEFAULT_SUBJECT_FMT.into(),
            }
        );
        assert!(AuditSinkConfig::parse("jsonl:", none).is_err());
        assert!(AuditSinkConfig::parse("kafka", none).is_err());
    }

    #[test]
    fn nats_settings_come_from_lookup() {
        let cfg = AuditSinkConfig::from_lookup(|key| match key {
            "BCAST_AUDIT_SINK" => Some("nats".into()),
            "NATS_URL" => Some("nats://bus:4222".into()),
            "BCAST_AUDIT_SUBJECT_FMT" => Some("audit.{tenant}".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(
            cfg,
            AuditSinkConfig::Nats {
                url: "nats://bus:4222".into(),
                subject_fmt: "audit.{tenant}".into(),
            }
        );
    }
}
