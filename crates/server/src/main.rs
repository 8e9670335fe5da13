use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use intake::{Deliverable, IntakeError};
use shared::{
    domain::{ContactSubmission, FormKind, ProposalSubmission},
    error::ApiError,
    protocol::{healthz_route, SubmitAccepted},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod sinks;

use app_state::AppState;
use config::load_settings;
use sinks::build_intake_context;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let intake = build_intake_context(&settings).await?;
    let app = build_router(Arc::new(AppState { intake }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(healthz_route(), get(healthz))
        .route(FormKind::Contact.route(), post(submit_contact))
        .route(FormKind::Proposal.route(), post(submit_proposal))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::map_response(payload_too_large_as_json))
        .with_state(state)
}

/// The body limit answers in plain text, both when the declared length is
/// too big and when buffering overruns. Clients expect the `{error}` shape.
async fn payload_too_large_as_json(response: Response) -> Response {
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(ApiError::payload_too_large()),
    )
        .into_response()
}

async fn healthz() -> &'static str {
    "ok"
}

async fn submit_contact(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SubmitAccepted>, (StatusCode, Json<ApiError>)> {
    submit::<ContactSubmission>(&state, &body).await
}

async fn submit_proposal(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SubmitAccepted>, (StatusCode, Json<ApiError>)> {
    submit::<ProposalSubmission>(&state, &body).await
}

async fn submit<T: Deliverable>(
    state: &AppState,
    body: &[u8],
) -> Result<Json<SubmitAccepted>, (StatusCode, Json<ApiError>)> {
    match intake::receive::<T>(&state.intake, body).await {
        Ok(_receipt) => Ok(Json(SubmitAccepted::ok())),
        Err(err @ IntakeError::Validation(_)) => {
            Err((StatusCode::BAD_REQUEST, Json(err.to_api_error())))
        }
        Err(err) => {
            error!(form = T::FORM.label(), error = %err, "unexpected error handling submission");
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(err.to_api_error())))
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
