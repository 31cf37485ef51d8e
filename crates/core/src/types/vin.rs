//! Vehicle Identification Number.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Vin`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VinError {
    /// The VIN does not have exactly 17 characters.
    #[error("VIN must be exactly 17 characters (got {0})")]
    WrongLength(usize),
    /// The VIN contains a character other than A-Z or 0-9.
    #[error("VIN contains invalid character '{0}'")]
    InvalidCharacter(char),
}

/// A 17-character vehicle identification number.
///
/// Stored upper-cased. Surrounding whitespace is ignored when parsing.
///
/// ```
/// use wheelstory_core::Vin;
///
/// let vin = Vin::parse(" 1hgcm82633a004352 ").unwrap();
/// assert_eq!(vin.as_str(), "1HGCM82633A004352");
/// assert!(Vin::parse("1HGCM82633").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    /// Number of characters in every VIN.
    pub const LENGTH: usize = 17;

    /// Parse a VIN.
    ///
    /// # Errors
    ///
    /// Returns [`VinError::WrongLength`] unless the trimmed input has exactly
    /// 17 characters, and [`VinError::InvalidCharacter`] for anything that is
    /// not an ASCII letter or digit.
    pub fn parse(s: &str) -> Result<Self, VinError> {
        let trimmed = s.trim();
        let len = trimmed.chars().count();
        if len != Self::LENGTH {
            return Err(VinError::WrongLength(len));
        }

        if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(VinError::InvalidCharacter(bad));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Apply the landing-page input mask to raw keystrokes.
    ///
    /// Upper-cases, drops everything that is not A-Z or 0-9 and caps the
    /// result at 17 characters.
    #[must_use]
    pub fn sanitize_input(raw: &str) -> String {
        raw.chars()
            .map(|c| c.to_ascii_uppercase())
            .filter(char::is_ascii_alphanumeric)
            .take(Self::LENGTH)
            .collect()
    }

    /// Returns the VIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Vin {
    type Err = VinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let vin = Vin::parse("1HGCM82633A004352").unwrap();
        assert_eq!(vin.as_str(), "1HGCM82633A004352");
    }

    #[test]
    fn test_parse_uppercases_and_trims() {
        let vin = Vin::parse("  1hgcm82633a004352\n").unwrap();
        assert_eq!(vin.to_string(), "1HGCM82633A004352");
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(Vin::parse(""), Err(VinError::WrongLength(0)));
        assert_eq!(Vin::parse("1HGCM82633A00435"), Err(VinError::WrongLength(16)));
        assert_eq!(
            Vin::parse("1HGCM82633A0043521"),
            Err(VinError::WrongLength(18))
        );
    }

    #[test]
    fn test_parse_invalid_character() {
        assert_eq!(
            Vin::parse("1HGCM82633A00435-"),
            Err(VinError::InvalidCharacter('-'))
        );
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(Vin::sanitize_input("1hg-cm 826"), "1HGCM826");
        assert_eq!(
            Vin::sanitize_input("1HGCM82633A004352EXTRA"),
            "1HGCM82633A004352"
        );
    }
}
