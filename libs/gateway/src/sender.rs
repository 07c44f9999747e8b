use async_trait::async_trait;
use bcast_core::{DeliveryAck, DeliveryError, MessagePayload, MessageSender};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::body::request_for;
use crate::config::GatewayConfig;

/// Delivers payloads through an HTTP WhatsApp gateway.
///
/// Requests go to `{base}/message/{endpoint}/{instance}`. A base URL starting
/// with `mock://` short-circuits and acknowledges without any I/O.
pub struct GatewaySender {
    http: reqwest::Client,
    api_base: String,
    instance: String,
    api_key: Option<String>,
}

impl GatewaySender {
    pub fn new(http: reqwest::Client, config: &GatewayConfig) -> Self {
        Self {
            http,
            api_base: config.base_url.trim_end_matches('/').to_string(),
            instance: config.instance.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn is_mock(&self) -> bool {
        self.api_base.starts_with("mock://")
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/message/{endpoint}/{}", self.api_base, self.instance)
    }
}

#[async_trait]
impl MessageSender for GatewaySender {
    async fn send(
        &self,
        recipient: &str,
        payload: &MessagePayload,
    ) -> Result<DeliveryAck, DeliveryError> {
        let (endpoint, body) = request_for(recipient, payload);

        if self.is_mock() {
            return Ok(DeliveryAck {
                message_id: Some(format!("mock:{}:{recipient}", self.instance)),
                raw: Some(body),
            });
        }

        let url = self.build_url(endpoint);
        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), endpoint, "gateway rejected message");
            return Err(classify_status(status, &body_text));
        }

        let raw: Value = response.json().await.unwrap_or(Value::Null);
        let message_id = raw
            .get("key")
            .and_then(|key| key.get("id"))
            .or_else(|| raw.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(DeliveryAck {
            message_id,
            raw: Some(raw),
        })
    }
}

/// Maps a non-success response to a delivery error.
///
/// Auth failures and a missing instance mean no further send can succeed;
/// everything else is scoped to the recipient.
pub fn classify_status(status: StatusCode, body: &str) -> DeliveryError {
    let detail = format!("status={} body={}", status.as_u16(), truncate(body, 256));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DeliveryError::fatal(format!("gateway rejected credentials: {detail}"))
        }
        StatusCode::NOT_FOUND if body.to_ascii_lowercase().contains("instance") => {
            DeliveryError::fatal(format!("gateway instance unavailable: {detail}"))
        }
        _ => DeliveryError::recipient(detail),
    }
}

fn transport_error(err: reqwest::Error) -> DeliveryError {
    if err.is_connect() {
        DeliveryError::fatal(format!("gateway unreachable: {err}"))
    } else {
        DeliveryError::recipient(format!("gateway transport: {err}"))
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_and_missing_instance_are_fatal() {
        assert!(classify_status(StatusCode::UNAUTHORIZED, "").is_fatal());
        assert!(classify_status(StatusCode::FORBIDDEN, "{}").is_fatal());
        assert!(
            classify_status(
                StatusCode::NOT_FOUND,
                r#"{"error":"The \"main\" instance does not exist"}"#
            )
            .is_fatal()
        );
    }

    #[test]
    fn other_failures_are_recipient_scoped() {
        let err = classify_status(StatusCode::BAD_REQUEST, r#"{"exists":false}"#);
        assert!(!err.is_fatal());
        assert_eq!(err.message(), r#"status=400 body={"exists":false}"#);
        assert!(!classify_status(StatusCode::NOT_FOUND, "no route").is_fatal());
        assert!(!classify_status(StatusCode::BAD_GATEWAY, "").is_fatal());
    }

    #[test]
    fn urls_are_scoped_to_the_instance() {
        let sender = GatewaySender::new(
            reqwest::Client::new(),
            &GatewayConfig {
                base_url: "https://wa.example.com/".into(),
                instance: "sales".into(),
                ..GatewayConfig::default()
            },
        );
        assert_eq!(
            sender.build_url("sendText"),
            "https://wa.example.com/message/sendText/sales"
        );
        assert!(!sender.is_mock());
    }
}
