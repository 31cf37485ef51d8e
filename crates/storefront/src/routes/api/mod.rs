//! JSON and webhook endpoints.

pub mod card;
pub mod notifications;
pub mod transactions;
pub mod webhooks;
