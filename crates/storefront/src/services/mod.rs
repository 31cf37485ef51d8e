//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `mail` - Outbound mail transports behind the `Mailer` trait
//! - `notifier` - Renders every email and routes it to a transport
//! - `paddle` - Payment provider lookups and webhook signatures
//! - `intent` - Signed tokens carrying the landing form to checkout
//! - `checkout` - Checkout submission state machine

pub mod checkout;
pub mod intent;
pub mod mail;
pub mod notifier;
pub mod paddle;

pub use checkout::{CheckoutFlow, CheckoutState, SubmitOutcome};
pub use intent::{IntentError, IntentSigner};
pub use mail::{Mailer, Mailers, MessageId, OutgoingEmail, ResendMailer, SendError};
pub use notifier::{
    NotificationDispatcher, NotificationReceipt, Notifier, NotifyError, OrderData,
    PaymentNotification,
};
pub use paddle::{PaddleClient, PaymentProvider, ProviderError, WebhookVerifier};
