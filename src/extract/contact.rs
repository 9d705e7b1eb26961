use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{ContactAction, ContactTarget};

/// Keys that mark an explicit contact line, English and Russian.
const CONTACT_KEYS: &[&str] = &[
    "contact",
    "contacts",
    "agent",
    "whatsapp",
    "контакт",
    "контакты",
    "агент",
];

lazy_static! {
    // Phone-shaped token: digit, 6+ of digit/space/hyphen/parens, digit.
    static ref PHONE_RX: Regex = Regex::new(r"(\+?\d[\d \-\(\)]{6,}\d)").unwrap();

    static ref HANDLE_RX: Regex = Regex::new(r"@([A-Za-z0-9_]{5,})").unwrap();
    static ref TME_RX: Regex = Regex::new(r"(?i)t\.me/([A-Za-z0-9_]{5,})").unwrap();
    static ref ANY_HANDLE_RX: Regex =
        Regex::new(r"(?i)(@[A-Za-z0-9_]{5,}|t\.me/[A-Za-z0-9_]{5,})").unwrap();

    // Stripping patterns for the cleaned body text.
    static ref INLINE_HANDLE_RX: Regex = Regex::new(r"@\w{5,}").unwrap();
    static ref TME_URL_RX: Regex = Regex::new(r"(?i)https?://t\.me/\w{5,}").unwrap();
    static ref TME_BARE_RX: Regex = Regex::new(r"(?i)\bt\.me/\w{5,}").unwrap();
    static ref MULTI_SPACE_RX: Regex = Regex::new(r"[ \t]{2,}").unwrap();
    static ref MULTI_NEWLINE_RX: Regex = Regex::new(r"\n{3,}").unwrap();
}

fn is_contact_key(key: &str) -> bool {
    let key = key.trim().to_lowercase();
    CONTACT_KEYS.contains(&key.as_str())
}

/// First phone-shaped token in `text`, untrimmed of its inner formatting.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_RX
        .find(text)
        .map(|m| m.as_str().trim().to_string())
}

/// Finds the line carrying contact information.
///
/// An explicit `Contact:`/`Agent:`/`WhatsApp:` line wins, even with an empty
/// value. Without one, the whole text is treated as the contact line when it
/// contains an `@handle`, a `t.me/` link, or a phone-shaped token — many
/// users skip the label.
pub fn extract_contact_line(text: &str) -> Option<String> {
    for line in text.lines() {
        if let Some((key, value)) = line.split_once(':') {
            if is_contact_key(key) {
                return Some(value.trim().to_string());
            }
        }
    }
    if ANY_HANDLE_RX.is_match(text) || extract_phone(text).is_some() {
        return Some(text.to_string());
    }
    None
}

/// Keeps a leading `+` and digits, drops everything else.
fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Resolves a contact line into a target: `@handle` or `t.me/handle` for the
/// messaging side, the first phone-shaped token for the phone side.
pub fn parse_contact_target(line: &str) -> ContactTarget {
    let handle = HANDLE_RX
        .captures(line)
        .or_else(|| TME_RX.captures(line))
        .map(|c| c[1].to_string());
    let phone = extract_phone(line).map(|p| normalize_phone(&p));

    match (handle, phone) {
        (Some(h), Some(p)) => ContactTarget::Both(h, p),
        (Some(h), None) => ContactTarget::Handle(h),
        (None, Some(p)) => ContactTarget::Phone(p),
        (None, None) => ContactTarget::None,
    }
}

/// Builds the outbound contact deep links for a submission text.
///
/// Telegram link first, WhatsApp second; the WhatsApp link requires at least
/// 9 digits. An empty vec means no contact UI, not a failure.
pub fn build_contact_actions(text: &str) -> Vec<ContactAction> {
    let Some(line) = extract_contact_line(text) else {
        return Vec::new();
    };

    let mut actions = Vec::new();
    let target = parse_contact_target(&line);

    if let ContactTarget::Handle(handle) | ContactTarget::Both(handle, _) = &target {
        actions.push(ContactAction {
            label: "💬 Contact on Telegram".to_string(),
            url: format!("https://t.me/{handle}"),
        });
    }

    if let ContactTarget::Phone(phone) | ContactTarget::Both(_, phone) = &target {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() >= 9 {
            actions.push(ContactAction {
                label: "🟢 Message on WhatsApp".to_string(),
                url: format!("https://wa.me/{digits}"),
            });
        }
    }

    actions
}

/// Removes contact lines and inline handles/links/phones from the body text,
/// then tidies the leftover whitespace.
///
/// The publishing path still renders from the raw text, so contact lines can
/// remain visible in the body next to the contact buttons.
#[allow(dead_code)]
pub fn strip_contacts(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| match line.split_once(':') {
            Some((key, _)) => !is_contact_key(key),
            None => true,
        })
        .collect();

    let clean = kept.join("\n");
    let clean = INLINE_HANDLE_RX.replace_all(&clean, "");
    let clean = TME_URL_RX.replace_all(&clean, "");
    let clean = TME_BARE_RX.replace_all(&clean, "");
    let clean = PHONE_RX.replace_all(&clean, "");
    let clean = MULTI_SPACE_RX.replace_all(&clean, " ");
    let clean = MULTI_NEWLINE_RX.replace_all(&clean, "\n\n");
    clean.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_contact_line_wins() {
        let text = "2BR in Marina\nContact: @broker_name, +971 50 123 45 67";
        let line = extract_contact_line(text).unwrap();
        assert_eq!(line, "@broker_name, +971 50 123 45 67");
    }

    #[test]
    fn parses_both_handle_and_phone() {
        let target = parse_contact_target("@broker_name, +971 50 123 45 67");
        assert_eq!(
            target,
            ContactTarget::Both("broker_name".to_string(), "+971501234567".to_string())
        );
    }

    #[test]
    fn parses_tme_link_as_handle() {
        let target = parse_contact_target("reach me at t.me/broker_name");
        assert_eq!(target, ContactTarget::Handle("broker_name".to_string()));
    }

    #[test]
    fn short_handles_are_ignored() {
        assert_eq!(parse_contact_target("@abc"), ContactTarget::None);
    }

    #[test]
    fn falls_back_to_whole_text_without_label() {
        let text = "Spacious studio, call +971 50 123 45 67 anytime";
        assert_eq!(extract_contact_line(text).as_deref(), Some(text));

        let text = "No contact info in here at all";
        assert_eq!(extract_contact_line(text), None);
    }

    #[test]
    fn russian_contact_key_is_recognized() {
        let text = "Контакт: @broker_name";
        assert_eq!(extract_contact_line(text).as_deref(), Some("@broker_name"));
    }

    #[test]
    fn builds_telegram_then_whatsapp_actions() {
        let actions = build_contact_actions("Contact: @broker_name, +971 50 123 45 67");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].url, "https://t.me/broker_name");
        assert_eq!(actions[1].url, "https://wa.me/971501234567");
    }

    #[test]
    fn short_phone_gets_no_whatsapp_action() {
        // 8 digits: phone-shaped, but below the wa.me threshold.
        let actions = build_contact_actions("Contact: 12 34 56 78");
        assert!(actions.is_empty());
    }

    #[test]
    fn no_contact_means_no_actions() {
        assert!(build_contact_actions("Just a lovely flat").is_empty());
    }

    #[test]
    fn strip_removes_every_contact_shape() {
        let text = "Great 2BR apartment\nContact: @broker_name\nCall +971 50 123 45 67\n\n\n\nVisit t.me/side_channel or https://t.me/other_channel";
        let clean = strip_contacts(text);
        assert!(!PHONE_RX.is_match(&clean), "phone left in: {clean:?}");
        assert!(!ANY_HANDLE_RX.is_match(&clean), "handle left in: {clean:?}");
        assert!(!clean.contains("\n\n\n"));
        assert!(clean.contains("Great 2BR apartment"));
    }

    #[test]
    fn strip_is_identity_for_clean_text() {
        let text = "Bright 1BR with garden view";
        assert_eq!(strip_contacts(text), text);
    }
}
