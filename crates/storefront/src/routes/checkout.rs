//! Checkout page route handlers.
//!
//! The intent token in the path replaces client-side storage. A token that is
//! tampered with, malformed or expired sends the visitor back to `/`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::instrument;
use wheelstory_core::types::form::{CARD_NUMBER_INPUT_MAX, CVV_MAX, ZIP_CODE_MAX};
use wheelstory_core::{
    COUNTRIES, CardValidation, Country, FieldErrors, FormField, OrderIntent, PaymentFormData,
};

use crate::error::add_breadcrumb;
use crate::services::{CheckoutFlow, SubmitOutcome};
use crate::state::AppState;

/// One rendered form input.
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub error: Option<String>,
    pub autofocus: bool,
    pub input_type: &'static str,
    pub placeholder: &'static str,
    pub maxlength: Option<usize>,
}

const fn label(field: FormField) -> &'static str {
    match field {
        FormField::Email => "Email Address",
        FormField::FirstName => "First Name",
        FormField::LastName => "Last Name",
        FormField::Country => "Country",
        FormField::CardNumber => "Card Number",
        FormField::ExpiryDate => "Expiry Date",
        FormField::Cvv => "CVV",
        FormField::NameOnCard => "Name on Card",
        FormField::BillingAddress => "Billing Address",
        FormField::City => "City",
        FormField::State => "State",
        FormField::ZipCode => "ZIP Code",
    }
}

const fn placeholder(field: FormField) -> &'static str {
    match field {
        FormField::Email => "you@example.com",
        FormField::CardNumber => "1234 5678 9012 3456",
        FormField::ExpiryDate => "MM/YY",
        FormField::Cvv => "123",
        FormField::ZipCode => "12345",
        _ => "",
    }
}

const fn maxlength(field: FormField) -> Option<usize> {
    match field {
        FormField::CardNumber => Some(CARD_NUMBER_INPUT_MAX),
        FormField::ExpiryDate => Some(5),
        FormField::Cvv => Some(CVV_MAX),
        FormField::ZipCode => Some(ZIP_CODE_MAX),
        _ => None,
    }
}

fn field_views(form: &PaymentFormData, errors: &FieldErrors) -> Vec<FieldView> {
    let focus = errors.first();
    FormField::ALL
        .into_iter()
        .map(|field| FieldView {
            name: field.name(),
            label: label(field),
            value: form.value(field).to_string(),
            error: errors.get(field).map(str::to_string),
            autofocus: focus == Some(field),
            input_type: if field == FormField::Email {
                "email"
            } else {
                "text"
            },
            placeholder: placeholder(field),
            maxlength: maxlength(field),
        })
        .collect()
}

/// Checkout form template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/checkout.html")]
pub struct CheckoutTemplate {
    pub token: String,
    pub vin: String,
    pub car_model: String,
    pub price: String,
    pub fields: Vec<FieldView>,
    pub countries: &'static [Country],
    pub card_feedback: CardValidation,
}

/// "Submission complete" template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/complete.html")]
pub struct CompleteTemplate {
    pub vin: String,
    pub car_model: String,
    pub email: String,
    /// Non-blocking notice when the confirmation emails could not be sent.
    pub warning: Option<&'static str>,
}

fn checkout_page(state: &AppState, token: String, flow: &CheckoutFlow) -> CheckoutTemplate {
    let checkout = &state.config().checkout;
    CheckoutTemplate {
        token,
        vin: flow.intent().vin.to_string(),
        car_model: flow.intent().car_model.clone(),
        price: format!("{}{:.2}", checkout.currency, checkout.price),
        fields: field_views(flow.form(), flow.errors()),
        countries: COUNTRIES,
        card_feedback: flow.card_feedback(),
    }
}

fn open_intent(state: &AppState, token: &str) -> Option<OrderIntent> {
    state
        .intents()
        .open(token)
        .inspect_err(|e| tracing::info!(error = %e, "Intent token rejected"))
        .ok()
}

/// Display the checkout form.
///
/// GET /checkout/{token}
#[instrument(skip(state, token))]
pub async fn show(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    let Some(intent) = open_intent(&state, &token) else {
        return Redirect::to("/").into_response();
    };

    let flow = CheckoutFlow::new(intent, state.config().checkout.clone());
    checkout_page(&state, token, &flow).into_response()
}

/// Submit the checkout form.
///
/// POST /checkout/{token}
#[instrument(skip(state, token, form))]
pub async fn submit(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<PaymentFormData>,
) -> Response {
    let Some(intent) = open_intent(&state, &token) else {
        return Redirect::to("/").into_response();
    };

    let mut flow = CheckoutFlow::new(intent, state.config().checkout.clone());
    flow.fill(&form);

    match flow.submit(state.dispatcher(), Utc::now()).await {
        SubmitOutcome::Rejected(errors) => {
            let field = errors.first().map_or("", FormField::name);
            add_breadcrumb("checkout", "Validation rejected", Some(&[("field", field)]));
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                checkout_page(&state, token, &flow),
            )
                .into_response()
        }
        SubmitOutcome::Completed(_) => complete_page(&flow, None).into_response(),
        SubmitOutcome::CompletedWithWarning(warning) => {
            complete_page(&flow, Some(warning)).into_response()
        }
    }
}

fn complete_page(flow: &CheckoutFlow, warning: Option<&'static str>) -> CompleteTemplate {
    CompleteTemplate {
        vin: flow.intent().vin.to_string(),
        car_model: flow.intent().car_model.clone(),
        email: flow.form().email.clone(),
        warning,
    }
}
