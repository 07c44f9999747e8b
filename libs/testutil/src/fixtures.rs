use bcast_core::{
    ButtonKind, CardButton, CarouselCard, GroupMember, MemberRole, MessagePayload, Recipient,
    SourceGroup,
};

/// Identifier of the `n`-th fixture recipient (1-based).
pub fn phone(n: usize) -> String {
    format!("55119{n:08}")
}

/// `n` distinct recipients labelled "Contact 1".."Contact n".
pub fn recipients(n: usize) -> Vec<Recipient> {
    (1..=n)
        .map(|i| Recipient::new(phone(i)).with_display_name(Some(format!("Contact {i}"))))
        .collect()
}

pub fn text() -> MessagePayload {
    MessagePayload::text("Promo: 20% off this week")
}

pub fn card(image: &str, text: &str) -> CarouselCard {
    CarouselCard {
        image: image.to_string(),
        text: text.to_string(),
        buttons: vec![CardButton {
            kind: ButtonKind::Url,
            label: "Open".into(),
            value: Some("https://shop.example.com".into()),
        }],
    }
}

pub fn carousel(images: &[&str]) -> MessagePayload {
    MessagePayload::Carousel {
        intro: Some("New arrivals".into()),
        cards: images
            .iter()
            .enumerate()
            .map(|(idx, image)| card(image, &format!("Item {}", idx + 1)))
            .collect(),
    }
}

/// Member with a verified number.
pub fn member(n: usize) -> GroupMember {
    GroupMember::new(format!("{}@s.whatsapp.net", phone(n))).with_phone(phone(n))
}

pub fn admin(n: usize) -> GroupMember {
    member(n).with_role(MemberRole::Admin)
}

pub fn group(name: &str, members: Vec<GroupMember>) -> SourceGroup {
    SourceGroup {
        id: format!("{}@g.us", name.to_lowercase().replace(' ', "-")),
        name: name.to_string(),
        members,
    }
}
