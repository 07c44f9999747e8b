use std::collections::HashSet;

use thiserror::Error;

use crate::payload::{CarouselCard, MessagePayload};
use crate::recipient::Recipient;

/// Minimum number of cards in a carousel.
pub const MIN_CAROUSEL_CARDS: usize = 2;

/// Reasons a job is refused before it starts. Card and button indexes are 1-based.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no recipients to send to")]
    NoRecipients,
    #[error("no recipients left after selection")]
    EmptySelection,
    #[error("recipient identifier is empty at position {position}")]
    EmptyIdentifier { position: usize },
    #[error("duplicate recipient {identifier}")]
    DuplicateRecipient { identifier: String },
    #[error("text message is empty")]
    EmptyText,
    #[error("media source is empty")]
    EmptyMediaSource,
    #[error("carousel needs at least 2 cards, got {count}")]
    TooFewCards { count: usize },
    #[error("carousel card {card} has no image")]
    CardMissingImage { card: usize },
    #[error("carousel card {card} has no text")]
    CardMissingText { card: usize },
    #[error("carousel card {card} button {button} has no label")]
    ButtonMissingLabel { card: usize, button: usize },
    #[error("carousel card {card} button {button} needs a value")]
    ButtonMissingValue { card: usize, button: usize },
    #[error("delay band is inverted: min {min_ms}ms > max {max_ms}ms")]
    InvalidDelayBand { min_ms: u64, max_ms: u64 },
}

impl ValidationError {
    /// 1-based index of the offending carousel card, if any.
    pub fn card(&self) -> Option<usize> {
        match self {
            ValidationError::CardMissingImage { card }
            | ValidationError::CardMissingText { card }
            | ValidationError::ButtonMissingLabel { card, .. }
            | ValidationError::ButtonMissingValue { card, .. } => Some(*card),
            _ => None,
        }
    }
}

/// Checks the payload shape rules.
///
/// ```
/// use bcast_core::{validate_payload, MessagePayload, ValidationError};
///
/// assert!(validate_payload(&MessagePayload::text("hi")).is_ok());
/// assert_eq!(
///     validate_payload(&MessagePayload::text("   ")),
///     Err(ValidationError::EmptyText)
/// );
/// ```
pub fn validate_payload(payload: &MessagePayload) -> Result<(), ValidationError> {
    match payload {
        MessagePayload::Text { content } => {
            if content.trim().is_empty() {
                return Err(ValidationError::EmptyText);
            }
        }
        MessagePayload::Media { source, .. } => {
            if source.trim().is_empty() {
                return Err(ValidationError::EmptyMediaSource);
            }
        }
        MessagePayload::Carousel { cards, .. } => validate_cards(cards)?,
    }
    Ok(())
}

fn validate_cards(cards: &[CarouselCard]) -> Result<(), ValidationError> {
    if cards.len() < MIN_CAROUSEL_CARDS {
        return Err(ValidationError::TooFewCards { count: cards.len() });
    }
    for (idx, card) in cards.iter().enumerate() {
        let card_no = idx + 1;
        if card.image.trim().is_empty() {
            return Err(ValidationError::CardMissingImage { card: card_no });
        }
        if card.text.trim().is_empty() {
            return Err(ValidationError::CardMissingText { card: card_no });
        }
        for (bidx, button) in card.buttons.iter().enumerate() {
            if button.label.trim().is_empty() {
                return Err(ValidationError::ButtonMissingLabel {
                    card: card_no,
                    button: bidx + 1,
                });
            }
            let has_value = button
                .value
                .as_deref()
                .is_some_and(|v| !v.trim().is_empty());
            if button.kind.requires_value() && !has_value {
                return Err(ValidationError::ButtonMissingValue {
                    card: card_no,
                    button: bidx + 1,
                });
            }
        }
    }
    Ok(())
}

/// Recipient list must be non-empty with unique, non-blank identifiers.
pub fn validate_recipients(recipients: &[Recipient]) -> Result<(), ValidationError> {
    if recipients.is_empty() {
        return Err(ValidationError::NoRecipients);
    }
    let mut seen = HashSet::with_capacity(recipients.len());
    for (idx, recipient) in recipients.iter().enumerate() {
        if recipient.identifier.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier { position: idx + 1 });
        }
        if !seen.insert(recipient.identifier.as_str()) {
            return Err(ValidationError::DuplicateRecipient {
                identifier: recipient.identifier.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{ButtonKind, CardButton, MediaKind};

    fn card(image: &str, text: &str) -> CarouselCard {
        CarouselCard {
            image: image.into(),
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    #[test]
    fn single_card_carousel_is_rejected() {
        let payload = MessagePayload::Carousel {
            intro: None,
            cards: vec![card("https://x/a.png", "A")],
        };
        assert_eq!(
            validate_payload(&payload),
            Err(ValidationError::TooFewCards { count: 1 })
        );
    }

    #[test]
    fn card_without_text_is_identified() {
        let payload = MessagePayload::Carousel {
            intro: Some("hi".into()),
            cards: vec![card("https://x/a.png", "A"), card("https://x/b.png", " ")],
        };
        let err = validate_payload(&payload).unwrap_err();
        assert_eq!(err, ValidationError::CardMissingText { card: 2 });
        assert_eq!(err.card(), Some(2));
        assert_eq!(err.to_string(), "carousel card 2 has no text");
    }

    #[test]
    fn card_without_image_is_identified() {
        let payload = MessagePayload::Carousel {
            intro: None,
            cards: vec![card("", "A"), card("https://x/b.png", "B")],
        };
        assert_eq!(
            validate_payload(&payload),
            Err(ValidationError::CardMissingImage { card: 1 })
        );
    }

    #[test]
    fn button_rules() {
        let mut first = card("https://x/a.png", "A");
        first.buttons.push(CardButton {
            kind: ButtonKind::Reply,
            label: "Yes".into(),
            value: None,
        });
        let mut second = card("https://x/b.png", "B");
        second.buttons.push(CardButton {
            kind: ButtonKind::Call,
            label: "Call us".into(),
            value: Some(" ".into()),
        });
        let payload = MessagePayload::Carousel {
            intro: None,
            cards: vec![first.clone(), second],
        };
        assert_eq!(
            validate_payload(&payload),
            Err(ValidationError::ButtonMissingValue { card: 2, button: 1 })
        );

        let mut unlabeled = card("https://x/c.png", "C");
        unlabeled.buttons.push(CardButton {
            kind: ButtonKind::Url,
            label: "".into(),
            value: Some("https://example.com".into()),
        });
        let payload = MessagePayload::Carousel {
            intro: None,
            cards: vec![first, unlabeled],
        };
        assert_eq!(
            validate_payload(&payload),
            Err(ValidationError::ButtonMissingLabel { card: 2, button: 1 })
        );
    }

    #[test]
    fn media_needs_source() {
        let payload = MessagePayload::Media {
            kind: MediaKind::Image,
            source: "".into(),
            caption: Some("cap".into()),
            filename: None,
        };
        assert_eq!(
            validate_payload(&payload),
            Err(ValidationError::EmptyMediaSource)
        );
    }

    #[test]
    fn recipients_must_be_unique_and_present() {
        assert_eq!(validate_recipients(&[]), Err(ValidationError::NoRecipients));
        let dupes = vec![Recipient::new("1"), Recipient::new("2"), Recipient::new("1")];
        assert_eq!(
            validate_recipients(&dupes),
            Err(ValidationError::DuplicateRecipient {
                identifier: "1".into()
            })
        );
        let blank = vec![Recipient::new("1"), Recipient::new(" ")];
        assert_eq!(
            validate_recipients(&blank),
            Err(ValidationError::EmptyIdentifier { position: 2 })
        );
    }
}
