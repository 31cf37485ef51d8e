//! Live card number feedback.

use axum::{Json, extract::Query};
use serde::{Deserialize, Serialize};
use wheelstory_core::{CardValidation, FormField};

#[derive(Debug, Default, Deserialize)]
pub struct CardFeedbackQuery {
    #[serde(default)]
    pub number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFeedback {
    /// The input after the card number mask.
    pub formatted: String,
    #[serde(flatten)]
    pub validation: CardValidation,
}

/// GET /api/card-feedback?number=
pub async fn feedback(Query(query): Query<CardFeedbackQuery>) -> Json<CardFeedback> {
    let formatted = FormField::CardNumber.format_input(&query.number);
    let validation = CardValidation::for_input(&formatted);
    Json(CardFeedback {
        formatted,
        validation,
    })
}
