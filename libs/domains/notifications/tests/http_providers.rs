//! HTTP adapters against a local stub of the provider APIs.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use domain_notifications::providers::{ResendConfig, SendGridConfig};
use domain_notifications::{
    AttemptOutcome, DeliveryService, EmailConfig, EmailContent, EmailProvider, ErrorCategory,
    ProviderName, ResendProvider, SendGridProvider, Sender,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replies with the scripted statuses in order, then 200.
#[derive(Clone, Default)]
struct Stub {
    script: Arc<Mutex<Vec<StatusCode>>>,
    requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

impl Stub {
    fn with_script(statuses: &[u16]) -> Self {
        let stub = Self::default();
        *stub.script.lock().unwrap() = statuses
            .iter()
            .rev()
            .map(|s| StatusCode::from_u16(*s).unwrap())
            .collect();
        stub
    }

    fn requests(&self) -> Vec<(HeaderMap, Value)> {
        self.requests.lock().unwrap().clone()
    }

    fn next_status(&self) -> StatusCode {
        self.script.lock().unwrap().pop().unwrap_or(StatusCode::OK)
    }
}

async fn resend_emails(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    stub.requests.lock().unwrap().push((headers, body));
    match stub.next_status() {
        StatusCode::OK => (StatusCode::OK, Json(json!({"id": "re_123"}))),
        status => (status, Json(json!({"name": "error", "message": "stubbed failure"}))),
    }
}

async fn sendgrid_send(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    stub.requests.lock().unwrap().push((headers, body));
    match stub.next_status() {
        StatusCode::OK => (StatusCode::ACCEPTED, [("x-message-id", "sg_456")], String::new()),
        status => (
            status,
            [("x-message-id", "")],
            json!({"errors": [{"message": "stubbed failure"}]}).to_string(),
        ),
    }
}

async fn serve(stub: Stub) -> String {
    let app = Router::new()
        .route("/emails", post(resend_emails))
        .route("/v3/mail/send", post(sendgrid_send))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn email() -> EmailContent {
    EmailContent {
        to_email: "center@example.com".into(),
        subject: "Schedule Change Request – Jane Doe".into(),
        html_body: "<p>Hi</p>".into(),
        text_body: "Hi".into(),
        reply_to: Some("mary@example.com".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn resend_success_returns_message_id() {
    let stub = Stub::default();
    let base = serve(stub.clone()).await;
    let provider = ResendProvider::new(ResendConfig::new("re_key").with_api_url(base), Sender::default());

    let sent = provider.send(&email()).await.unwrap();

    assert_eq!(sent.message_id.as_deref(), Some("re_123"));
    let requests = stub.requests();
    assert_eq!(requests[0].0["authorization"], "Bearer re_key");
    assert_eq!(requests[0].1["reply_to"], "mary@example.com");
    assert_eq!(requests[0].1["from"], "Tutoring Center <noreply@localhost>");
}

#[tokio::test]
async fn resend_classifies_statuses() {
    let stub = Stub::with_script(&[429, 422]);
    let base = serve(stub).await;
    let provider = ResendProvider::new(ResendConfig::new("re_key").with_api_url(base), Sender::default());

    let err = provider.send(&email()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Transient);

    let err = provider.send(&email()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Permanent);
    assert!(err.to_string().contains("stubbed failure"));
}

#[tokio::test]
async fn sendgrid_reads_message_id_header() {
    let stub = Stub::default();
    let base = serve(stub.clone()).await;
    let provider = SendGridProvider::new(
        SendGridConfig::new("SG.key").with_api_url(format!("{base}/v3")),
        Sender::default(),
    );

    let sent = provider.send(&email()).await.unwrap();

    assert_eq!(sent.message_id.as_deref(), Some("sg_456"));
    assert_eq!(stub.requests()[0].1["personalizations"][0]["to"][0]["email"], "center@example.com");
}

#[tokio::test]
async fn sendgrid_server_error_is_transient() {
    let stub = Stub::with_script(&[503, 400]);
    let base = serve(stub).await;
    let provider = SendGridProvider::new(
        SendGridConfig::new("SG.key").with_api_url(format!("{base}/v3")),
        Sender::default(),
    );

    assert!(provider.send(&email()).await.unwrap_err().is_retryable());
    assert!(!provider.send(&email()).await.unwrap_err().is_retryable());
}

#[tokio::test]
async fn unreachable_provider_is_transient() {
    let provider = ResendProvider::new(
        ResendConfig::new("re_key").with_api_url("http://127.0.0.1:9"),
        Sender::default(),
    );

    let err = provider.send(&email()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Transient);
    assert!(err.to_string().starts_with("resend"));
}

#[tokio::test]
async fn service_retries_through_resolved_provider() {
    let stub = Stub::with_script(&[500, 503]);
    let base = serve(stub.clone()).await;
    let config = EmailConfig::default()
        .with_resend(ResendConfig::new("re_key").with_api_url(base))
        .with_retry_base_delay(Duration::from_millis(1));

    let service = DeliveryService::from_config(&config).unwrap();
    let receipt = service.deliver(&email()).await.unwrap();

    assert_eq!(receipt.provider, ProviderName::Resend);
    assert_eq!(
        receipt.attempts.iter().map(|a| a.outcome).collect::<Vec<_>>(),
        vec![
            AttemptOutcome::TransientFailure,
            AttemptOutcome::TransientFailure,
            AttemptOutcome::Success,
        ]
    );
    assert_eq!(stub.requests().len(), 3);
}
