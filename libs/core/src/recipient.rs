use serde::{Deserialize, Serialize};

/// A single delivery target inside a dispatch job.
///
/// `identifier` is the canonical address (digits for phone-derived targets,
/// the raw protocol id otherwise) and is the deduplication key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_label: Option<String>,
}

impl Recipient {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: None,
            origin_label: None,
        }
    }

    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin_label = Some(origin.into());
        self
    }

    /// Human label used in progress reporting.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.identifier)
    }
}

/// Outcome of one delivery attempt; appended in attempt order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchResult {
    pub identifier: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DispatchResult {
    pub fn delivered(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            success: true,
            error_message: None,
        }
    }

    pub fn failed(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            success: false,
            error_message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_display_name() {
        let named = Recipient::new("5511987654321").with_display_name(Some("Ana".into()));
        assert_eq!(named.label(), "Ana");
        let blank = Recipient::new("5511987654321").with_display_name(Some("  ".into()));
        assert_eq!(blank.label(), "5511987654321");
    }
}
