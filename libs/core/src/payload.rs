use serde::{Deserialize, Serialize};

/// Composed message delivered to every recipient of a dispatch job.
///
/// ```
/// use bcast_core::{MessagePayload, PayloadKind};
///
/// let payload = MessagePayload::text("Weekly update");
/// assert_eq!(payload.kind(), PayloadKind::Text);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    Text {
        content: String,
    },
    Media {
        kind: MediaKind,
        /// Either a remote URL or an inline `data:` URI.
        source: String,
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

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        MessagePayload::Text {
            content: content.into(),
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            MessagePayload::Text { .. } => PayloadKind::Text,
            MessagePayload::Media { .. } => PayloadKind::Media,
            MessagePayload::Carousel { .. } => PayloadKind::Carousel,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Text,
    Media,
    Carousel,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Text => "text",
            PayloadKind::Media => "media",
            PayloadKind::Carousel => "carousel",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarouselCard {
    /// Durable URL or transient `data:` URI.
    pub image: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<CardButton>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardButton {
    pub kind: ButtonKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ButtonKind {
    Url,
    Reply,
    Call,
}

impl ButtonKind {
    /// URL and CALL buttons carry a target; REPLY buttons only need a label.
    pub fn requires_value(&self) -> bool {
        matches!(self, ButtonKind::Url | ButtonKind::Call)
    }
}

/// Returns true when `reference` points at storage that outlives the process.
pub fn is_durable_ref(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Returns true for inline `data:` URIs.
pub fn is_inline_ref(reference: &str) -> bool {
    reference
        .trim_start()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}
