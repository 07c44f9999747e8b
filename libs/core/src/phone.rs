//! Phone-number normalization for protocol addresses and member records.

/// Shortest digit run accepted as a verified phone number.
pub const MIN_PHONE_DIGITS: usize = 8;
/// E.164 upper bound.
pub const MAX_PHONE_DIGITS: usize = 15;
/// Display names need a longer run before they are treated as numbers.
pub const MIN_NAME_DIGITS: usize = 10;

const PHONE_JID_DOMAINS: &[&str] = &["s.whatsapp.net", "c.us"];
const MASK_CHARS: &[char] = &['*', '•', '●', '#'];

/// Keeps ASCII digits only.
///
/// ```
/// assert_eq!(bcast_core::phone::digits("+55 (11) 98765-4321"), "5511987654321");
/// ```
pub fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Detects numbers the upstream redacted, e.g. `+55 11 9****-4321`.
pub fn is_masked(raw: &str) -> bool {
    raw.contains(MASK_CHARS) || raw.contains("xx") || raw.contains("XX")
}

/// Normalizes a verified number into its digits-only canonical form.
pub fn normalize_phone(raw: &str) -> Option<String> {
    if raw.trim().is_empty() || is_masked(raw) {
        return None;
    }
    let number = digits(raw);
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS)
        .contains(&number.len())
        .then_some(number)
}

/// Extracts the phone number from a phone-backed JID such as
/// `5511987654321:12@s.whatsapp.net`. Returns `None` for other address kinds.
pub fn phone_from_jid(jid: &str) -> Option<String> {
    let (local, domain) = jid.trim().split_once('@')?;
    if !PHONE_JID_DOMAINS
        .iter()
        .any(|known| domain.eq_ignore_ascii_case(known))
    {
        return None;
    }
    let local = local.split(':').next().unwrap_or(local);
    if local.is_empty() || !local.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    normalize_phone(local)
}

/// Pulls a number out of a free-text display name.
///
/// Heuristic: every digit in the name is collected, so names that merely
/// contain long digit runs are taken as numbers too.
pub fn phone_from_display_name(name: &str) -> Option<String> {
    let number = digits(name);
    (MIN_NAME_DIGITS..=MAX_PHONE_DIGITS)
        .contains(&number.len())
        .then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_numbers_are_rejected() {
        assert!(is_masked("+55 11 9****-4321"));
        assert!(is_masked("+1 555 xx12"));
        assert_eq!(normalize_phone("+55 11 9****-4321"), None);
        assert_eq!(
            normalize_phone("+55 11 98765-4321").as_deref(),
            Some("5511987654321")
        );
    }

    #[test]
    fn short_or_long_numbers_are_rejected() {
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("1234567890123456"), None);
    }

    #[test]
    fn jid_parsing_handles_device_suffix_and_domains() {
        assert_eq!(
            phone_from_jid("5511987654321:12@s.whatsapp.net").as_deref(),
            Some("5511987654321")
        );
        assert_eq!(
            phone_from_jid("14155550100@c.us").as_deref(),
            Some("14155550100")
        );
        assert_eq!(phone_from_jid("120363025@lid"), None);
        assert_eq!(phone_from_jid("120363025246125@g.us"), None);
        assert_eq!(phone_from_jid("no-at-sign"), None);
    }

    #[test]
    fn display_name_heuristic_needs_ten_digits() {
        assert_eq!(
            phone_from_display_name("+55 11 98765-4321").as_deref(),
            Some("5511987654321")
        );
        assert_eq!(phone_from_display_name("Ana 2024"), None);
        // known false positive: any long digit run is accepted
        assert_eq!(
            phone_from_display_name("Order 1234567890").as_deref(),
            Some("1234567890")
        );
    }
}
