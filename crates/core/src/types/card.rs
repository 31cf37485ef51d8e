//! Payment card number validation, classification and formatting.
//!
//! These functions accept the raw text of the card number field. Separators
//! and any other non-digit characters are ignored, so `"4111 1111 1111 1111"`
//! and `"4111111111111111"` always produce the same answers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Fewest digits a card number may have.
pub const MIN_DIGITS: usize = 13;

/// Most digits a card number may have.
pub const MAX_DIGITS: usize = 19;

/// Card brand derived from the number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    #[serde(rename = "Visa")]
    Visa,
    #[serde(rename = "Mastercard")]
    Mastercard,
    #[serde(rename = "American Express")]
    AmericanExpress,
    #[serde(rename = "Discover")]
    Discover,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl CardType {
    /// Display name of the brand.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Visa => "Visa",
            Self::Mastercard => "Mastercard",
            Self::AmericanExpress => "American Express",
            Self::Discover => "Discover",
            Self::Unknown => "Unknown",
        }
    }

    /// Number of CVV digits the brand uses.
    #[must_use]
    pub const fn cvv_length(self) -> usize {
        match self {
            Self::AmericanExpress => 4,
            _ => 3,
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keep only the ASCII digits of `input`.
#[must_use]
pub fn digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Whether `input` is a structurally valid card number.
///
/// Non-digits are dropped, the remaining digit count must be within
/// [`MIN_DIGITS`]..=[`MAX_DIGITS`], and the Luhn checksum must be a multiple
/// of ten. An all-zero number of valid length passes.
#[must_use]
pub fn is_valid_number(input: &str) -> bool {
    let digits = digits(input);
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .bytes()
        .rev()
        .map(|b| u32::from(b - b'0'))
        .enumerate()
        .map(|(i, digit)| {
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}

/// Classify the card brand from the number prefix.
///
/// Rules are checked in order and the first match wins:
/// Visa (`4`), Mastercard (`51`-`55` or `2221`-`2720`), American Express
/// (`34`, `37`), Discover (`6`).
#[must_use]
pub fn classify(input: &str) -> CardType {
    let digits = digits(input);

    if digits.starts_with('4') {
        return CardType::Visa;
    }

    let mastercard_classic = digits
        .strip_prefix('5')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| ('1'..='5').contains(&c));
    let mastercard_two_series = digits
        .get(..4)
        .and_then(|prefix| prefix.parse::<u32>().ok())
        .is_some_and(|prefix| (2221..=2720).contains(&prefix));
    if mastercard_classic || mastercard_two_series {
        return CardType::Mastercard;
    }

    if digits.starts_with("34") || digits.starts_with("37") {
        return CardType::AmericanExpress;
    }

    if digits.starts_with('6') {
        return CardType::Discover;
    }

    CardType::Unknown
}

/// Group the digits of `input` into blocks of four separated by one space.
///
/// No length cap is applied here and no trailing space is produced.
#[must_use]
pub fn format_number(input: &str) -> String {
    let digits = digits(input);
    let mut out = String::with_capacity(digits.len() + digits.len() / 4);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && i % 4 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Last four digits of a card number, masked for display in notifications.
#[must_use]
pub fn mask_number(input: &str) -> String {
    let digits = digits(input);
    let tail: String = digits
        .chars()
        .skip(digits.len().saturating_sub(4))
        .collect();
    if tail.is_empty() {
        String::new()
    } else {
        format!("**** **** **** {tail}")
    }
}

/// Live validation feedback for the card number field.
///
/// Both fields stay `None` ("unknown") until the field holds at least
/// [`MIN_DIGITS`] digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardValidation {
    pub is_valid: Option<bool>,
    pub card_type: Option<CardType>,
}

impl CardValidation {
    /// Compute feedback for the current field contents.
    #[must_use]
    pub fn for_input(input: &str) -> Self {
        if digits(input).len() >= MIN_DIGITS {
            Self {
                is_valid: Some(is_valid_number(input)),
                card_type: Some(classify(input)),
            }
        } else {
            Self::default()
        }
    }

    /// Whether no verdict has been reached yet.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.is_valid.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_numbers() {
        assert!(is_valid_number("4111111111111111"));
        assert_eq!(classify("4111111111111111"), CardType::Visa);

        assert!(is_valid_number("5500000000000004"));
        assert_eq!(classify("5500000000000004"), CardType::Mastercard);

        assert!(is_valid_number("340000000000009"));
        assert_eq!(classify("340000000000009"), CardType::AmericanExpress);
    }

    #[test]
    fn test_luhn_failure() {
        assert!(!is_valid_number("1234567890123456"));
        assert!(!is_valid_number("4111111111111112"));
    }

    #[test]
    fn test_length_bounds() {
        assert!(!is_valid_number(""));
        // 12 zeros: Luhn sum is 0 but too short
        assert!(!is_valid_number("000000000000"));
        assert!(is_valid_number("0000000000000"));
        assert!(is_valid_number("0000000000000000000"));
        assert!(!is_valid_number("00000000000000000000"));
    }

    #[test]
    fn test_all_zero_passes() {
        assert!(is_valid_number("0000 0000 0000 0000"));
    }

    #[test]
    fn test_separators_are_ignored() {
        let cases = [
            ("4111111111111111", "4111 1111 1111 1111"),
            ("4111111111111111", "4111-1111-1111-1111"),
            ("5500000000000004", "5 5 0 0 0 0 0 0 0 0 0 0 0 0 0 4"),
            ("1234567890123456", "1234.5678.9012.3456"),
            ("340000000000009", "3400 000000 00009"),
        ];
        for (plain, separated) in cases {
            assert_eq!(is_valid_number(plain), is_valid_number(separated));
            assert_eq!(classify(plain), classify(separated));
        }
    }

    #[test]
    fn test_non_digit_input() {
        assert!(!is_valid_number("abcd efgh ijkl mnop"));
        assert_eq!(classify("abcd"), CardType::Unknown);
    }

    #[test]
    fn test_classify_rules() {
        assert_eq!(classify("4"), CardType::Visa);
        assert_eq!(classify("51"), CardType::Mastercard);
        assert_eq!(classify("55"), CardType::Mastercard);
        assert_eq!(classify("2221 0000"), CardType::Mastercard);
        assert_eq!(classify("2720 9999"), CardType::Mastercard);
        assert_eq!(classify("34"), CardType::AmericanExpress);
        assert_eq!(classify("37"), CardType::AmericanExpress);
        assert_eq!(classify("6011"), CardType::Discover);
        assert_eq!(classify("65"), CardType::Discover);

        assert_eq!(classify("50"), CardType::Unknown);
        assert_eq!(classify("56"), CardType::Unknown);
        assert_eq!(classify("5"), CardType::Unknown);
        assert_eq!(classify("2220 9999"), CardType::Unknown);
        assert_eq!(classify("2721"), CardType::Unknown);
        assert_eq!(classify("222"), CardType::Unknown);
        assert_eq!(classify("35"), CardType::Unknown);
        assert_eq!(classify(""), CardType::Unknown);
    }

    #[test]
    fn test_classification_is_independent_of_validity() {
        assert!(!is_valid_number("4111111111111112"));
        assert_eq!(classify("4111111111111112"), CardType::Visa);
    }

    #[test]
    fn test_cvv_length() {
        assert_eq!(CardType::AmericanExpress.cvv_length(), 4);
        assert_eq!(CardType::Visa.cvv_length(), 3);
        assert_eq!(CardType::Mastercard.cvv_length(), 3);
        assert_eq!(CardType::Discover.cvv_length(), 3);
        assert_eq!(CardType::Unknown.cvv_length(), 3);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(""), "");
        assert_eq!(format_number("4111"), "4111");
        assert_eq!(format_number("41111"), "4111 1");
        assert_eq!(format_number("4111-1111 1111x1111"), "4111 1111 1111 1111");
        assert_eq!(
            format_number("41111111111111111111"),
            "4111 1111 1111 1111 1111"
        );
    }

    #[test]
    fn test_mask_number() {
        assert_eq!(mask_number("4111 1111 1111 1234"), "**** **** **** 1234");
        assert_eq!(mask_number("12"), "**** **** **** 12");
        assert_eq!(mask_number(""), "");
    }

    #[test]
    fn test_validation_feedback() {
        assert!(CardValidation::for_input("4111 1111 1111").is_unknown());

        let feedback = CardValidation::for_input("4111 1111 1111 1111");
        assert_eq!(feedback.is_valid, Some(true));
        assert_eq!(feedback.card_type, Some(CardType::Visa));

        let feedback = CardValidation::for_input("1234 5678 9012 3456");
        assert_eq!(feedback.is_valid, Some(false));
        assert_eq!(feedback.card_type, Some(CardType::Unknown));
    }

    #[test]
    fn test_card_type_serializes_display_name() {
        let json = serde_json::to_string(&CardType::AmericanExpress).unwrap_or_default();
        assert_eq!(json, "\"American Express\"");
    }
}
