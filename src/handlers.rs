use crate::config::Config;
use crate::entrata_client::UpstreamResponse;
use crate::errors::AppError;
use crate::forwarder::LeadForwarder;
use crate::lead_models::IncomingLead;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared application state injected into handlers.
///
/// Built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    /// Resolves, maps and sends leads to Entrata.
    pub forwarder: LeadForwarder,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let forwarder = LeadForwarder::from_config(&config)?;
        Ok(Self { forwarder })
    }
}

/// Response returned after Entrata accepted a lead.
#[derive(Debug, Serialize)]
pub struct LeadForwardResponse {
    pub success: bool,
    pub message: String,
    /// Entrata's response, JSON when it parsed, raw text otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<UpstreamResponse>,
}

impl From<UpstreamResponse> for LeadForwardResponse {
    fn from(upstream: UpstreamResponse) -> Self {
        Self {
            success: true,
            message: "Lead sent to Entrata successfully".to_string(),
            upstream: (!upstream.is_empty()).then_some(upstream),
        }
    }
}

/// Builds the application router (without rate limiting, which needs peer
/// addresses and is layered on in `main`).
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ok).post(receive_lead))
        .route("/health", get(health))
        .route("/p/:property_id", post(receive_lead_for_property))
        .route("/debug", post(debug_echo))
        .with_state(state)
}

/// GET /
///
/// Plain-text liveness probe.
pub async fn ok() -> &'static str {
    "OK"
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "method": state.forwarder.method().name(),
        })),
    )
}

/// POST /
///
/// Forwards a form submission; `propertyId` may come from the body or
/// `?propertyId=`.
pub async fn receive_lead(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LeadForwardResponse>, AppError> {
    tracing::info!("POST / - lead received");
    let Json(body) = body?;
    let incoming = IncomingLead::from_body(body)?.with_query(query);
    forward(&state, incoming).await
}

/// POST /p/:property_id
///
/// Same as `POST /`, with the path segment as a lower-priority
/// `propertyId` source.
pub async fn receive_lead_for_property(
    State(state): State<Arc<AppState>>,
    Path(property_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LeadForwardResponse>, AppError> {
    tracing::info!("POST /p/{} - lead received", property_id);
    let Json(body) = body?;
    let incoming = IncomingLead::from_body(body)?
        .with_query(query)
        .with_path_property_id(Some(property_id));
    forward(&state, incoming).await
}

async fn forward(
    state: &AppState,
    incoming: IncomingLead,
) -> Result<Json<LeadForwardResponse>, AppError> {
    let upstream = state.forwarder.forward(incoming).await?;
    Ok(Json(upstream.into()))
}

/// POST /debug
///
/// Logs and echoes whatever the form tool sent, for wiring up new forms.
pub async fn debug_echo(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(body) = body?;
    tracing::info!(
        "Form tool sent this payload:\n{}",
        serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
    );

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Received payload",
            "receivedData": body,
        })),
    ))
}
