//! Landing page route handlers.
//!
//! The landing form collects VIN, email and car model. A valid submission is
//! sealed into a signed intent token and the visitor is sent to
//! `/checkout/{token}`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;
use wheelstory_core::{OrderIntent, Vin};

use crate::error::AppError;
use crate::state::AppState;

/// Landing form fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LandingForm {
    pub vin: String,
    pub email: String,
    pub car_model: String,
}

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/landing.html")]
pub struct LandingTemplate {
    pub vin: String,
    pub email: String,
    pub car_model: String,
    /// Shown above the form after a rejected submission.
    pub error: Option<String>,
    /// Report price with currency, e.g. "$1.99".
    pub price: String,
}

fn price_label(state: &AppState) -> String {
    let checkout = &state.config().checkout;
    format!("{}{:.2}", checkout.currency, checkout.price)
}

/// Display the landing page.
#[instrument(skip(state))]
pub async fn landing(State(state): State<AppState>) -> impl IntoResponse {
    LandingTemplate {
        vin: String::new(),
        email: String::new(),
        car_model: String::new(),
        error: None,
        price: price_label(&state),
    }
}

/// Handle the landing form.
///
/// POST /
#[instrument(skip(state, form), fields(vin = %form.vin))]
pub async fn submit(State(state): State<AppState>, Form(form): Form<LandingForm>) -> Response {
    let vin = Vin::sanitize_input(&form.vin);

    let intent = match OrderIntent::new(&vin, &form.email, &form.car_model, Utc::now()) {
        Ok(intent) => intent,
        Err(e) => {
            tracing::info!(error = %e, "Landing form rejected");
            let page = LandingTemplate {
                vin,
                email: form.email,
                car_model: form.car_model,
                error: Some(e.to_string()),
                price: price_label(&state),
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    match state.intents().issue(&intent) {
        Ok(token) => {
            tracing::info!(vin = %intent.vin, "Order intent issued");
            Redirect::to(&format!("/checkout/{token}")).into_response()
        }
        Err(e) => AppError::Unexpected(e.to_string()).into_response(),
    }
}
