use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, serde::rfc3339};
use uuid::Uuid;

use crate::payload::{CarouselCard, MediaKind, MessagePayload, PayloadKind, is_inline_ref};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Completed,
    Cancelled,
    Error,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Completed => "completed",
            AuditStatus::Cancelled => "cancelled",
            AuditStatus::Error => "error",
        }
    }
}

/// Persisted copy of what was sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadSnapshot {
    Text {
        content: String,
    },
    Media {
        media_kind: MediaKind,
        /// `None` when the media was sent inline and never had a URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    Carousel {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intro: Option<String>,
        cards: Vec<CarouselCard>,
    },
}

impl PayloadSnapshot {
    /// Snapshot with references copied verbatim; carousel images are swapped
    /// for durable URLs later, during finalize.
    pub fn from_payload(payload: &MessagePayload) -> Self {
        match payload {
            MessagePayload::Text { content } => PayloadSnapshot::Text {
                content: content.clone(),
            },
            MessagePayload::Media {
                kind,
                source,
                caption,
                filename,
            } => PayloadSnapshot::Media {
                media_kind: *kind,
                url: (!is_inline_ref(source)).then(|| source.clone()),
                caption: caption.clone(),
                filename: filename.clone(),
            },
            MessagePayload::Carousel { intro, cards } => PayloadSnapshot::Carousel {
                intro: intro.clone(),
                cards: cards.clone(),
            },
        }
    }
}

/// Immutable summary of one dispatch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub id: Uuid,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    pub targeted: usize,
    pub success: usize,
    pub failure: usize,
    pub status: AuditStatus,
    #[serde(with = "rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub completed_at: OffsetDateTime,
    pub duration_ms: u64,
    pub payload_kind: PayloadKind,
    pub payload: PayloadSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    /// Sends that were attempted (delivered or failed).
    pub fn attempted(&self) -> usize {
        self.success + self.failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_media_has_no_snapshot_url() {
        let inline = MessagePayload::Media {
            kind: MediaKind::Image,
            source: "data:image/png;base64,AAAA".into(),
            caption: Some("promo".into()),
            filename: None,
        };
        let PayloadSnapshot::Media { url, caption, .. } = PayloadSnapshot::from_payload(&inline)
        else {
            panic!("expected media snapshot");
        };
        assert_eq!(url, None);
        assert_eq!(caption.as_deref(), Some("promo"));
    }

    #[test]
    fn record_serializes_rfc3339_timestamps() {
        let record = AuditRecord {
            id: Uuid::nil(),
            job_id: "job-1".into(),
            tenant: None,
            targeted: 3,
            success: 2,
            failure: 1,
            status: AuditStatus::Completed,
            started_at: OffsetDateTime::UNIX_EPOCH,
            completed_at: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(90),
            duration_ms: 90_000,
            payload_kind: PayloadKind::Text,
            payload: PayloadSnapshot::Text {
                content: "hi".into(),
            },
            error: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["started_at"], "1970-01-01T00:00:00Z");
        assert_eq!(json["payload"]["kind"], "text");
        assert_eq!(record.attempted(), 3);
        let back: AuditRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
