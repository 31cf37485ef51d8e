//! Newtype IDs for payment provider entities.
//!
//! Provider IDs are opaque strings with a fixed type prefix (`txn_`, `ctm_`).
//! The `define_prefixed_id!` macro creates wrappers that check the prefix on
//! construction so a customer ID can never be passed where a transaction ID
//! is expected.

/// Errors that can occur when parsing a prefixed ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is empty or only whitespace.
    #[error("ID cannot be empty")]
    Empty,
    /// The input does not start with the expected prefix.
    #[error("ID must start with \"{prefix}\"")]
    WrongPrefix {
        /// Expected prefix.
        prefix: &'static str,
    },
}

/// Macro to define a type-safe prefixed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `parse()` that trims and checks the prefix, `as_str()`
/// - `Display`, `FromStr` and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use wheelstory_core::define_prefixed_id;
/// define_prefixed_id!(AddressId, "add_");
///
/// assert!(AddressId::parse("add_01h").is_ok());
/// assert!(AddressId::parse("ctm_01h").is_err());
/// ```
#[macro_export]
macro_rules! define_prefixed_id {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Required prefix.
            pub const PREFIX: &'static str = $prefix;

            /// Parse an ID, ignoring surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is blank or lacks the prefix.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdError> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err($crate::IdError::Empty);
                }
                if !trimmed.starts_with(Self::PREFIX) {
                    return Err($crate::IdError::WrongPrefix {
                        prefix: Self::PREFIX,
                    });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Get the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_prefixed_id!(TransactionId, "txn_");
define_prefixed_id!(CustomerId, "ctm_");
