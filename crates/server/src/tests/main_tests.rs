use super::*;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{body, body::Body, http::Request};
use intake::{IntakeContext, NotifyAddresses};
use mailer::{Notifier, OutboundEmail};
use serde_json::{json, Value};
use storage::{Storage, SubmissionStore};
use tokio::sync::Mutex;
use tower::ServiceExt;

struct BrokenStore;

#[async_trait]
impl SubmissionStore for BrokenStore {
    fn describe(&self) -> &'static str {
        "broken"
    }

    async fn insert_contact(&self, _submission: &ContactSubmission) -> anyhow::Result<()> {
        Err(anyhow!("connection refused"))
    }

    async fn insert_proposal(&self, _submission: &ProposalSubmission) -> anyhow::Result<()> {
        Err(anyhow!("connection refused"))
    }
}

#[derive(Default)]
struct CapturingNotifier {
    sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl Notifier for CapturingNotifier {
    fn describe(&self) -> &'static str {
        "capturing"
    }

    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<()> {
        self.sent.lock().await.push(email.clone());
        Ok(())
    }
}

fn addresses() -> NotifyAddresses {
    NotifyAddresses {
        from: "onboarding@resend.dev".into(),
        to: "owner@example.com".into(),
    }
}

fn app_with(intake: IntakeContext) -> Router {
    build_router(Arc::new(AppState { intake }))
}

fn log_only_app() -> Router {
    app_with(IntakeContext::log_only(addresses()))
}

fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn valid_contact() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "subject": "Analytical engine",
        "type": "question",
        "message": "Could we talk about Bernoulli numbers?",
    })
}

fn valid_proposal() -> Value {
    json!({
        "name": "Grace Hopper",
        "email": "grace@example.org",
        "company": "Remington Rand",
        "budget": "1000-5000",
        "deadline": "1952",
        "description": "A compiler that turns symbols into machine code.",
    })
}

#[tokio::test]
async fn healthz_reports_ok() {
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = log_only_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn valid_contact_without_sinks_is_accepted() {
    let response = log_only_app()
        .oneshot(post_json("/api/contact", valid_contact().to_string()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "success": true }));
}

#[tokio::test]
async fn invalid_contact_reports_only_failing_fields() {
    let body = json!({
        "name": "Al",
        "email": "bad-email",
        "subject": "Hi there",
        "type": "job",
        "message": "short",
    });
    let response = log_only_app()
        .oneshot(post_json("/api/contact", body.to_string()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");
    let details = body["details"].as_object().expect("details object");
    assert!(details.contains_key("email"));
    assert!(details.contains_key("message"));
    assert!(!details.contains_key("name"));
    assert!(!details.contains_key("subject"));
    assert!(details["email"].is_array());
}

#[tokio::test]
async fn malformed_json_is_an_internal_error() {
    let response = log_only_app()
        .oneshot(post_json("/api/proposal", "{\"name\": "))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Internal server error" })
    );
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let huge = "x".repeat(MAX_BODY_BYTES + 1);
    let response = log_only_app()
        .oneshot(post_json("/api/contact", huge))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(response).await, json!({ "error": "Payload too large" }));
}

#[tokio::test]
async fn oversized_declared_length_gets_json_error() {
    let huge = "x".repeat(MAX_BODY_BYTES + 1);
    let request = Request::post("/api/proposal")
        .header("content-type", "application/json")
        .header("content-length", huge.len())
        .body(Body::from(huge))
        .expect("request");
    let response = log_only_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(json_body(response).await, json!({ "error": "Payload too large" }));
}

#[tokio::test]
async fn proposal_is_persisted_to_sqlite() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let app = app_with(IntakeContext {
        store: Some(Arc::new(storage.clone())),
        notifier: None,
        addresses: addresses(),
        sink_timeout: Duration::from_secs(5),
    });

    let response = app
        .oneshot(post_json("/api/proposal", valid_proposal().to_string()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let stored = storage.list_proposals(10).await.expect("list");
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].submission.company.as_deref(),
        Some("Remington Rand")
    );
}

#[tokio::test]
async fn store_outage_still_notifies_and_accepts() {
    let notifier = Arc::new(CapturingNotifier::default());
    let app = app_with(IntakeContext {
        store: Some(Arc::new(BrokenStore)),
        notifier: Some(notifier.clone()),
        addresses: addresses(),
        sink_timeout: Duration::from_secs(5),
    });

    let response = app
        .oneshot(post_json("/api/contact", valid_contact().to_string()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let sent = notifier.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "[Portfolio Contact] Analytical engine");
}

#[tokio::test]
async fn resubmitting_the_same_payload_is_accepted_twice() {
    let app = log_only_app();
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/api/contact", valid_contact().to_string()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
