use super::*;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct ServerState {
    received: Arc<Mutex<Vec<(Option<String>, OutboundEmail)>>>,
    status: StatusCode,
}

async fn accept_email(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(email): Json<OutboundEmail>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.received.lock().await.push((auth, email));
    if state.status.is_success() {
        (state.status, Json(json!({ "id": "email-1" })))
    } else {
        (state.status, Json(json!({ "message": "API key is invalid" })))
    }
}

async fn spawn_email_api(status: StatusCode) -> (String, ServerState) {
    let state = ServerState {
        received: Arc::default(),
        status,
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/emails", post(accept_email))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn email() -> OutboundEmail {
    OutboundEmail {
        from: DEFAULT_FROM.into(),
        to: "owner@example.com".into(),
        subject: "[Portfolio Contact] Hi".into(),
        text: "body".into(),
    }
}

fn mailer(api_url: String) -> Mailer {
    Mailer::new(MailerConfig {
        api_url,
        api_key: "re_test".into(),
        timeout: Duration::from_secs(5),
    })
    .expect("mailer")
}

#[tokio::test]
async fn posts_email_with_bearer_key() {
    let (api_url, state) = spawn_email_api(StatusCode::OK).await;
    mailer(api_url).send(&email()).await.expect("send");

    let received = state.received.lock().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0.as_deref(), Some("Bearer re_test"));
    assert_eq!(received[0].1, email());
}

#[tokio::test]
async fn provider_rejection_surfaces_message() {
    let (api_url, _state) = spawn_email_api(StatusCode::UNAUTHORIZED).await;
    let err = mailer(api_url).send(&email()).await.expect_err("rejected");
    assert!(err.to_string().contains("API key is invalid"));
}

#[test]
fn endpoint_appends_emails_to_base_path() {
    assert_eq!(
        mailer("https://mail.example.com/v1".into()).endpoint().as_str(),
        "https://mail.example.com/v1/emails"
    );
    assert_eq!(
        mailer(DEFAULT_API_URL.into()).endpoint().as_str(),
        "https://api.resend.com/emails"
    );
}
