//! Contracts for the collaborators the dispatch engine consumes: message
//! delivery, durable media storage, and audit persistence.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::audit::AuditRecord;
use crate::payload::MessagePayload;

/// Gateway acknowledgement for one delivered message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeliveryAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

/// Delivery failure, split by blast radius.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The delivery capability itself is unusable (e.g. the session was
    /// logged out); the run must stop.
    #[error("fatal: {message}")]
    Fatal { message: String },
    /// Only this recipient was affected; the run continues.
    #[error("{message}")]
    Recipient { message: String },
}

impl DeliveryError {
    pub fn fatal(message: impl Into<String>) -> Self {
        DeliveryError::Fatal {
            message: message.into(),
        }
    }

    pub fn recipient(message: impl Into<String>) -> Self {
        DeliveryError::Recipient {
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, DeliveryError::Fatal { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            DeliveryError::Fatal { message } | DeliveryError::Recipient { message } => message,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unsupported media reference: {0}")]
    Unsupported(String),
    #[error("invalid inline media: {0}")]
    Decode(String),
    #[error("media store write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("audit append failed: {message}")]
pub struct AuditError {
    pub message: String,
}

impl AuditError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Delivers one message instance to one recipient.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        payload: &MessagePayload,
    ) -> Result<DeliveryAck, DeliveryError>;
}

/// Turns transient media (inline bytes, data URIs) into a durable URL.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn materialize(&self, reference: &str) -> Result<String, StoreError>;
}

/// Persists one summary record per finished run.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

pub type SharedSender = Arc<dyn MessageSender>;
pub type SharedStore = Arc<dyn DurableStore>;
pub type SharedAuditLogger = Arc<dyn AuditLogger>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_error_classification() {
        let fatal = DeliveryError::fatal("session logged out");
        assert!(fatal.is_fatal());
        assert_eq!(fatal.to_string(), "fatal: session logged out");
        let scoped = DeliveryError::recipient("number not on whatsapp");
        assert!(!scoped.is_fatal());
        assert_eq!(scoped.message(), "number not on whatsapp");
    }
}
