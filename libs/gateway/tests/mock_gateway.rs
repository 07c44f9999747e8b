use bcast_core::{ButtonKind, CardButton, CarouselCard, MediaKind, MessagePayload, MessageSender};
use bcast_gateway::{GatewayConfig, GatewaySender};

#[tokio::test]
async fn mock_transport_acknowledges_with_request_body() {
    let config = GatewayConfig {
        instance: "marketing".into(),
        ..GatewayConfig::default()
    };
    let sender = GatewaySender::new(config.http_client().unwrap(), &config);

    let ack = sender
        .send("5511999990001", &MessagePayload::text("hello"))
        .await
        .unwrap();
    assert_eq!(ack.message_id.as_deref(), Some("mock:marketing:5511999990001"));
    let raw = ack.raw.unwrap();
    assert_eq!(raw["number"], "5511999990001");
    assert_eq!(raw["text"], "hello");
}

fn mock_sender() -> GatewaySender {
    let config = GatewayConfig::default();
    GatewaySender::new(config.http_client().unwrap(), &config)
}

#[tokio::test]
async fn mock_transport_acknowledges_inline_media() {
    let payload = MessagePayload::Media {
        kind: MediaKind::Image,
        source: "data:image/jpeg;base64,/9j/4AAQ".into(),
        caption: Some("Weekend sale".into()),
        filename: None,
    };
    let ack = mock_sender().send("5511999990002", &payload).await.unwrap();
    assert_eq!(ack.message_id.as_deref(), Some("mock:default:5511999990002"));
    let raw = ack.raw.unwrap();
    assert_eq!(raw["media"], "/9j/4AAQ");
    assert_eq!(raw["mimetype"], "image/jpeg");
    assert_eq!(raw["caption"], "Weekend sale");
}

#[tokio::test]
async fn mock_transport_acknowledges_carousels() {
    let payload = MessagePayload::Carousel {
        intro: Some("New arrivals".into()),
        cards: vec![
            CarouselCard {
                image: "https://cdn.example.com/1.png".into(),
                text: "Sneakers".into(),
                buttons: vec![CardButton {
                    kind: ButtonKind::Url,
                    label: "Shop".into(),
                    value: Some("https://shop.example.com/1".into()),
                }],
            },
            CarouselCard {
                image: "https://cdn.example.com/2.png".into(),
                text: "Boots".into(),
                buttons: Vec::new(),
            },
        ],
    };
    let ack = mock_sender().send("774120010@lid", &payload).await.unwrap();
    assert_eq!(ack.message_id.as_deref(), Some("mock:default:774120010@lid"));
    let raw = ack.raw.unwrap();
    assert_eq!(raw["text"], "New arrivals");
    assert_eq!(raw["cards"].as_array().map(Vec::len), Some(2));
    assert_eq!(raw["cards"][0]["buttons"][0]["url"], "https://shop.example.com/1");
}
