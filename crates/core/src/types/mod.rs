//! Core types for WheelStory.
//!
//! This module provides type-safe wrappers for the domain concepts of the
//! VIN report funnel.

pub mod card;
pub mod country;
pub mod email;
pub mod event;
pub mod form;
pub mod id;
pub mod order;
pub mod price;
pub mod transaction;
pub mod vin;

pub use card::{CardType, CardValidation};
pub use country::{COUNTRIES, Country};
pub use email::{Email, EmailError};
pub use event::{
    DEFAULT_PRODUCT_NAME, EventData, EventItem, EventPrice, EventType, UnitPrice, WebhookEvent,
};
pub use form::{ExpiryDate, FieldError, FieldErrors, FormField, PaymentFormData};
pub use id::*;
pub use order::{OrderIntent, OrderIntentError};
pub use price::{DEFAULT_CURRENCY, Price};
pub use transaction::{NOT_AVAILABLE, TransactionItem, TransactionRecord};
pub use vin::{Vin, VinError};
