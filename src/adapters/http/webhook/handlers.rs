//! HTTP handlers for the PayPal webhook endpoint.
//!
//! The endpoint answers 200 to every delivery. PayPal retries anything
//! else, so verification failures are reported only in our logs.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, StatusCode};

use crate::application::handlers::webhook::{HandlePaypalWebhookHandler, WebhookOutcome};
use crate::domain::webhook::WebhookDelivery;

use super::dto::{AckResponse, HealthResponse, ProcessingErrorResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub webhook_handler: Arc<HandlePaypalWebhookHandler>,
}

impl WebhookAppState {
    pub fn new(webhook_handler: Arc<HandlePaypalWebhookHandler>) -> Self {
        Self { webhook_handler }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/paypal - Authenticate and process a PayPal delivery.
///
/// The body is taken as a `Result` so an oversized or aborted upload is
/// still answered with 200.
pub async fn handle_paypal_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let headers = header_pairs(&headers);

    let outcome = match body {
        Ok(body) => {
            state
                .webhook_handler
                .handle(WebhookDelivery::new(body.to_vec(), headers))
                .await
        }
        Err(rejection) => state.webhook_handler.reject_unreadable(
            &WebhookDelivery::new(Vec::new(), headers),
            rejection.body_text(),
        ),
    };

    match outcome {
        WebhookOutcome::Errored { .. } => {
            (StatusCode::OK, Json(ProcessingErrorResponse::new())).into_response()
        }
        WebhookOutcome::Accepted { .. }
        | WebhookOutcome::Duplicate { .. }
        | WebhookOutcome::Rejected { .. } => {
            (StatusCode::OK, Json(AckResponse::received())).into_response()
        }
    }
}

/// GET /health - Liveness check.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Header pairs with values that are valid visible ASCII; others are dropped.
fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
