// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact address normalization.
//!
//! Conversations are keyed by a digits-only, country-code-prefixed address so
//! that `+55 (85) 99999-0000`, `85 99999 0000` and `5585999990000` all land in
//! the same conversation.

/// Shortest normalized address accepted (country code + short local number).
const MIN_DIGITS: usize = 8;

/// E.164 caps numbers at 15 digits.
const MAX_DIGITS: usize = 15;

/// Normalizes a raw contact address.
///
/// Strips every non-digit, then prefixes `country_code` unless the digits
/// already start with it. Returns `None` when nothing usable remains or the
/// result falls outside E.164 length bounds.
pub fn normalize_address(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let normalized = if country_code.is_empty() || digits.starts_with(country_code) {
        digits
    } else {
        format!("{country_code}{digits}")
    };

    if (MIN_DIGITS..=MAX_DIGITS).contains(&normalized.len()) {
        Some(normalized)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_and_bare_forms_match() {
        let a = normalize_address("+55 85 99999-0000", "55");
        let b = normalize_address("5585999990000", "55");
        assert_eq!(a.as_deref(), Some("5585999990000"));
        assert_eq!(a, b);
    }

    #[test]
    fn missing_country_code_is_prefixed() {
        assert_eq!(
            normalize_address("(85) 99999-0000", "55").as_deref(),
            Some("5585999990000")
        );
    }

    #[test]
    fn empty_country_code_keeps_digits() {
        assert_eq!(
            normalize_address("+1 415 555 0100", "").as_deref(),
            Some("14155550100")
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(normalize_address("", "55"), None);
        assert_eq!(normalize_address("n/a", "55"), None);
        assert_eq!(normalize_address("12", "55"), None);
        assert_eq!(normalize_address("1234567890123456789", "55"), None);
    }

    proptest::proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "[0-9 +()-]{0,20}") {
            if let Some(once) = normalize_address(&raw, "55") {
                proptest::prop_assert_eq!(normalize_address(&once, "55"), Some(once));
            }
        }
    }
}
