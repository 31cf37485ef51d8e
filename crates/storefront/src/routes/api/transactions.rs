//! Transaction lookup.
//!
//! `GET /transaction-lookup?transactionId=txn_...` and
//! `POST /transaction-lookup` with `{"transactionId": "txn_..."}` both fetch
//! the transaction from the payment provider and return it flattened.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use wheelstory_core::{IdError, TransactionId, TransactionRecord};

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::services::ProviderError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub success: bool,
    pub message: &'static str,
    pub transaction: TransactionRecord,
}

/// GET /transaction-lookup
pub async fn lookup_get(
    State(state): State<AppState>,
    Query(query): Query<LookupRequest>,
) -> Result<Json<LookupResponse>> {
    lookup(&state, query.transaction_id.as_deref()).await
}

/// POST /transaction-lookup
pub async fn lookup_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LookupRequest>,
) -> Result<Json<LookupResponse>> {
    lookup(&state, body.transaction_id.as_deref()).await
}

fn parse_id(raw: Option<&str>) -> Result<TransactionId> {
    TransactionId::parse(raw.unwrap_or_default()).map_err(|e| match e {
        IdError::Empty => AppError::Validation("Transaction ID is required".to_string()),
        IdError::WrongPrefix { prefix } => AppError::Validation(format!(
            "Invalid transaction ID format. Transaction ID should start with \"{prefix}\""
        )),
    })
}

#[instrument(skip(state))]
async fn lookup(state: &AppState, raw: Option<&str>) -> Result<Json<LookupResponse>> {
    // Rejected ids never reach the provider.
    let id = parse_id(raw)?;
    let provider = state.provider().ok_or(ProviderError::NotConfigured)?;

    let transaction = provider.transaction(&id).await?;
    tracing::info!(transaction_id = %id, status = %transaction.status, "Transaction retrieved");

    Ok(Json(LookupResponse {
        success: true,
        message: "Transaction retrieved successfully",
        transaction,
    }))
}
