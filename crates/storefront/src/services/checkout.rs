//! Checkout submission flow.
//!
//! ```text
//! Editing -> Validating -> Editing              (rejected, field errors set)
//!                       -> Submitting -> Succeeded
//!                                     -> Failed (dispatch error, warning set)
//! ```
//!
//! The flow collects and forwards; it never charges the card. A dispatcher
//! failure does not fail the submission: the visitor sees the completion page
//! with a warning either way.

use chrono::{DateTime, Utc};
use wheelstory_core::{
    CardType, CardValidation, FieldErrors, FormField, OrderIntent, PaymentFormData,
};

use super::notifier::{NotificationDispatcher, NotificationReceipt, OrderData, PaymentNotification};
use crate::config::CheckoutConfig;

/// Shown on the completion page when the dispatcher failed.
pub const DISPATCH_WARNING: &str = "Payment processed but there was an issue sending confirmation emails. Please contact support if you don't receive your report within 12 hours.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Editing,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// What a call to [`CheckoutFlow::submit`] ended with.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Validation failed; the flow is back in `Editing`.
    Rejected(FieldErrors),
    /// The dispatcher accepted the order.
    Completed(NotificationReceipt),
    /// The dispatcher failed; the submission still counts as complete.
    CompletedWithWarning(&'static str),
}

/// One visitor's pass through the checkout form.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    intent: OrderIntent,
    settings: CheckoutConfig,
    form: PaymentFormData,
    errors: FieldErrors,
    state: CheckoutState,
    submitting: bool,
}

impl CheckoutFlow {
    /// Start editing a form prefilled from the landing page intent.
    #[must_use]
    pub fn new(intent: OrderIntent, settings: CheckoutConfig) -> Self {
        let form = PaymentFormData::prefilled(intent.email.as_str());
        Self {
            intent,
            settings,
            form,
            errors: FieldErrors::new(),
            state: CheckoutState::Editing,
            submitting: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    #[must_use]
    pub const fn form(&self) -> &PaymentFormData {
        &self.form
    }

    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[must_use]
    pub const fn intent(&self) -> &OrderIntent {
        &self.intent
    }

    /// Whether the submit control is disabled.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Apply one keystroke's worth of input to `field`.
    ///
    /// Ignored outside `Editing`. Clears any error shown for the field.
    pub fn input(&mut self, field: FormField, raw: &str) {
        if self.state != CheckoutState::Editing {
            return;
        }
        self.form.apply_input(field, raw);
        self.errors.clear(field);
    }

    /// Replace every field at once, as a posted form does.
    pub fn fill(&mut self, form: &PaymentFormData) {
        for field in FormField::REQUIRED_CHECK_ORDER {
            self.input(field, form.value(field));
        }
    }

    /// Card feedback for the current card number.
    #[must_use]
    pub fn card_feedback(&self) -> CardValidation {
        CardValidation::for_input(&self.form.card_number)
    }

    /// Validate and, if everything passes, hand the order to `dispatcher`.
    ///
    /// The dispatcher is called at most once per call and only after the
    /// configured processing delay.
    pub async fn submit(
        &mut self,
        dispatcher: &dyn NotificationDispatcher,
        now: DateTime<Utc>,
    ) -> SubmitOutcome {
        if self.state != CheckoutState::Editing {
            tracing::warn!(state = ?self.state, "Submit ignored outside editing");
            return SubmitOutcome::Rejected(self.errors.clone());
        }

        self.state = CheckoutState::Validating;
        let card_type = match self.form.validate(now.date_naive()) {
            Ok(card_type) => card_type,
            Err(errors) => {
                tracing::info!(
                    error_count = errors.len(),
                    first = errors.first().map(FormField::name),
                    "Checkout rejected"
                );
                self.errors = errors.clone();
                self.state = CheckoutState::Editing;
                return SubmitOutcome::Rejected(errors);
            }
        };

        self.errors = FieldErrors::new();
        self.state = CheckoutState::Submitting;
        self.submitting = true;

        tokio::time::sleep(self.settings.processing_delay).await;

        let notification = self.notification(card_type, now);
        let outcome = match dispatcher.dispatch(notification).await {
            Ok(receipt) => {
                tracing::info!(
                    vin = %self.intent.vin,
                    notification_id = %receipt.notification_id,
                    "Checkout submitted"
                );
                self.state = CheckoutState::Succeeded;
                SubmitOutcome::Completed(receipt)
            }
            Err(e) => {
                tracing::warn!(vin = %self.intent.vin, error = %e, "Checkout notification failed");
                self.state = CheckoutState::Failed;
                SubmitOutcome::CompletedWithWarning(DISPATCH_WARNING)
            }
        };

        self.submitting = false;
        outcome
    }

    fn notification(&self, card_type: CardType, now: DateTime<Utc>) -> PaymentNotification {
        tracing::debug!(card_type = %card_type, "Building payment notification");
        PaymentNotification {
            customer_email: self.form.email.trim().to_string(),
            customer_name: self.form.customer_name(),
            transaction_id: format!("TXN-{}", now.timestamp_millis()),
            vin: self.intent.vin.to_string(),
            car_model: Some(self.intent.car_model.clone()),
            amount: format!("{:.2}", self.settings.price),
            currency: self.settings.currency.clone(),
            form_data: Some(self.form.clone()),
            order_data: Some(OrderData {
                vin: Some(self.intent.vin.to_string()),
                car_model: Some(self.intent.car_model.clone()),
                email: Some(self.intent.email.to_string()),
                ..OrderData::default()
            }),
            ordered_at: now,
        }
    }
}
