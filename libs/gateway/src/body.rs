//! Request bodies for the gateway's message endpoints.

use bcast_core::{ButtonKind, CarouselCard, MessagePayload, is_inline_ref};
use serde_json::{Value, json};

/// Endpoint name and JSON body for one payload addressed to `number`.
pub fn request_for(number: &str, payload: &MessagePayload) -> (&'static str, Value) {
    match payload {
        MessagePayload::Text { content } => (
            "sendText",
            json!({
                "number": number,
                "text": content,
            }),
        ),
        MessagePayload::Media {
            kind,
            source,
            caption,
            filename,
        } => {
            let mut body = json!({
                "number": number,
                "mediatype": kind.as_str(),
                "media": media_field(source),
            });
            if let Some(caption) = caption {
                body["caption"] = json!(caption);
            }
            if let Some(filename) = filename {
                body["fileName"] = json!(filename);
            }
            if let Some(mime) = inline_mime(source) {
                body["mimetype"] = json!(mime);
            }
            ("sendMedia", body)
        }
        MessagePayload::Carousel { intro, cards } => {
            let mut body = json!({
                "number": number,
                "cards": cards.iter().map(card_json).collect::<Vec<_>>(),
            });
            if let Some(intro) = intro {
                body["text"] = json!(intro);
            }
            ("sendCarousel", body)
        }
    }
}

/// URLs are sent as-is; inline data is sent as bare base64.
fn media_field(source: &str) -> &str {
    if is_inline_ref(source) {
        source
            .split_once(',')
            .map(|(_, data)| data)
            .unwrap_or(source)
    } else {
        source.trim()
    }
}

fn inline_mime(source: &str) -> Option<&str> {
    if !is_inline_ref(source) {
        return None;
    }
    let meta = source.trim_start().get(5..)?.split(',').next()?;
    meta.split(';').next().filter(|mime| !mime.is_empty())
}

fn card_json(card: &CarouselCard) -> Value {
    let buttons: Vec<Value> = card
        .buttons
        .iter()
        .map(|button| {
            let mut out = json!({
                "type": match button.kind {
                    ButtonKind::Url => "URL",
                    ButtonKind::Reply => "REPLY",
                    ButtonKind::Call => "CALL",
                },
                "displayText": button.label,
            });
            if let Some(value) = &button.value {
                let key = match button.kind {
                    ButtonKind::Url => "url",
                    ButtonKind::Reply => "id",
                    ButtonKind::Call => "phoneNumber",
                };
                out[key] = json!(value);
            }
            out
        })
        .collect();
    json!({
        "image": media_field(&card.image),
        "text": card.text,
        "buttons": buttons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcast_core::{CardButton, MediaKind};

    #[test]
    fn text_body() {
        let (endpoint, body) = request_for("5511999990001", &MessagePayload::text("hello"));
        assert_eq!(endpoint, "sendText");
        assert_eq!(body, json!({"number": "5511999990001", "text": "hello"}));
    }

    #[test]
    fn inline_media_is_sent_as_base64_with_mime() {
        let payload = MessagePayload::Media {
            kind: MediaKind::Image,
            source: "data:image/png;base64,iVBORw0KGgo=".into(),
            caption: Some("promo".into()),
            filename: None,
        };
        let (endpoint, body) = request_for("5511999990001", &payload);
        assert_eq!(endpoint, "sendMedia");
        assert_eq!(body["media"], "iVBORw0KGgo=");
        assert_eq!(body["mimetype"], "image/png");
        assert_eq!(body["mediatype"], "image");
        assert_eq!(body["caption"], "promo");
        assert!(body.get("fileName").is_none());
    }

    #[test]
    fn carousel_buttons_map_to_gateway_keys() {
        let payload = MessagePayload::Carousel {
            intro: Some("New in".into()),
            cards: vec![
                CarouselCard {
                    image: "https://cdn.example.com/1.png".into(),
                    text: "One".into(),
                    buttons: vec![CardButton {
                        kind: ButtonKind::Call,
                        label: "Call us".into(),
                        value: Some("+551130000000".into()),
                    }],
                },
                CarouselCard {
                    image: "https://cdn.example.com/2.png".into(),
                    text: "Two".into(),
                    buttons: vec![CardButton {
                        kind: ButtonKind::Reply,
                        label: "More".into(),
                        value: None,
                    }],
                },
            ],
        };
        let (endpoint, body) = request_for("5511999990001", &payload);
        assert_eq!(endpoint, "sendCarousel");
        assert_eq!(body["text"], "New in");
        assert_eq!(body["cards"][0]["buttons"][0]["phoneNumber"], "+551130000000");
        assert_eq!(body["cards"][1]["buttons"][0]["type"], "REPLY");
        assert!(body["cards"][1]["buttons"][0].get("id").is_none());
    }
}
