//! `ResendMailer` against a local stub of the Resend API.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{TimeZone, Utc};
use secrecy::SecretString;
use serde_json::{Value, json};
use wheelstory_storefront::services::{Mailer, MessageId, OutgoingEmail, ResendMailer, SendError};

const API_KEY: &str = "re_stub_key";
const FROM: &str = "WheelStory <support@wheelstory.store>";

/// Authorization header and JSON body of every request the stub saw.
type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn emails(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let subject = body["subject"].as_str().unwrap_or_default().to_string();
    captured.lock().unwrap().push((auth, body));

    match subject.as_str() {
        "rejected" => (
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"name":"validation_error","message":"Invalid `to` field"}"#,
        )
            .into_response(),
        "garbled" => (StatusCode::OK, "not json").into_response(),
        _ => Json(json!({ "id": "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794" })).into_response(),
    }
}

async fn spawn_stub() -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/emails", post(emails))
        .with_state(captured.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), captured)
}

fn mailer(base_url: &str) -> ResendMailer {
    ResendMailer::with_base_url(&SecretString::from(API_KEY), FROM, base_url).unwrap()
}

fn email(subject: &str) -> OutgoingEmail {
    OutgoingEmail::html(
        vec!["buyer@example.com".to_string()],
        subject,
        "<p>Your report is on its way</p>",
    )
}

#[tokio::test]
async fn test_send_returns_api_id() {
    let (base_url, captured) = spawn_stub().await;
    let id = mailer(&base_url).send(email("Payment Successful")).await.unwrap();
    assert_eq!(
        id,
        MessageId("49a3999c-0ce1-4ea6-ab68-afcd6dc2e794".to_string())
    );

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let (auth, body) = &captured[0];
    assert_eq!(auth.as_deref(), Some("Bearer re_stub_key"));
    assert_eq!(body["from"], FROM);
    assert_eq!(body["to"], json!(["buyer@example.com"]));
    assert_eq!(body["subject"], "Payment Successful");
    assert_eq!(body["html"], "<p>Your report is on its way</p>");
    assert!(body.get("scheduled_at").is_none());
    assert!(body.get("bcc").is_none());
}

#[tokio::test]
async fn test_scheduled_send_carries_timestamp() {
    let (base_url, captured) = spawn_stub().await;
    let mut scheduled = email("Complete your WheelStory order");
    scheduled.scheduled_at = Some(Utc.with_ymd_and_hms(2026, 10, 19, 10, 1, 0).unwrap());
    scheduled.bcc = vec!["ops@wheelstory.store".to_string()];

    mailer(&format!("{base_url}/")).send(scheduled).await.unwrap();

    let captured = captured.lock().unwrap();
    let (_, body) = &captured[0];
    assert_eq!(body["scheduled_at"], "2026-10-19T10:01:00+00:00");
    assert_eq!(body["bcc"], json!(["ops@wheelstory.store"]));
}

#[tokio::test]
async fn test_non_success_status_is_api_error() {
    let (base_url, _) = spawn_stub().await;
    let result = mailer(&base_url).send(email("rejected")).await;

    let Err(SendError::Api { status, message }) = result else {
        panic!("expected API error, got {result:?}");
    };
    assert_eq!(status, 422);
    assert!(message.contains("Invalid `to` field"));
}

#[tokio::test]
async fn test_unparseable_success_body_is_error() {
    let (base_url, _) = spawn_stub().await;
    let result = mailer(&base_url).send(email("garbled")).await;
    assert!(result.is_err());
    assert!(!matches!(result, Err(SendError::Api { .. })));
}
