//! WheelStory Core - Shared types library.
//!
//! This crate provides the types and pure algorithms used by the WheelStory
//! storefront:
//! - `storefront` - Landing page, checkout funnel and notification API
//! - `integration-tests` - Black-box tests of the storefront router
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no mail transports. Everything here is deterministic given its
//! inputs (the current date is always passed in), which keeps it trivially
//! testable.
//!
//! # Modules
//!
//! - [`types`] - VINs, emails, provider ids, prices, card validation, checkout
//!   form data, order intents, transaction records and webhook events

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
