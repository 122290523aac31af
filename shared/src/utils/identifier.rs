//! Login identifier utilities
//!
//! A login identifier is either an email address or a mobile number.
//! These helpers classify raw input, normalize it, and mask it for logs.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

// Optional leading +, then 6 to 15 digits
static MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9]{6,15}$").expect("mobile regex is valid")
});

/// Kind of identifier detected in raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Email,
    Mobile,
}

/// Check whether a string looks like an email address
pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value.trim())
}

/// Remove formatting characters from a mobile number
pub fn normalize_mobile(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Check whether a string is a valid mobile number after normalization
pub fn is_mobile(value: &str) -> bool {
    let only_phone_chars = value
        .trim()
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')' | '.'));
    only_phone_chars && MOBILE_REGEX.is_match(&normalize_mobile(value))
}

/// Classify and normalize a raw identifier.
///
/// Emails are trimmed and lower-cased; mobiles lose separators.
/// Returns `None` when the input is neither.
pub fn classify(raw: &str) -> Option<(IdentifierKind, String)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_email(trimmed) {
        return Some((IdentifierKind::Email, trimmed.to_lowercase()));
    }
    if is_mobile(trimmed) {
        return Some((IdentifierKind::Mobile, normalize_mobile(trimmed)));
    }
    None
}

/// Mask an identifier for logging (e.g., u***@example.com, ******7899)
pub fn mask(value: &str) -> String {
    if let Some((local, domain)) = value.split_once('@') {
        let first: String = local.chars().take(1).collect();
        return format!("{}***@{}", first, domain);
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
