//! Axum router configuration for webhook endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{handle_paypal_webhook, health, WebhookAppState};

/// Create the webhook router.
///
/// Webhooks carry no user authentication; they are verified via the
/// transmission signature.
///
/// # Routes
/// - `POST /paypal` - Handle PayPal webhooks
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/paypal", post(handle_paypal_webhook))
}

/// Create the complete service router.
///
/// Bodies over `max_body_bytes` reach the webhook handler as a read error
/// and are acknowledged like any other rejected delivery. Slow processing
/// is bounded inside the handler, never by a transport timeout.
///
/// # Routes
/// - `POST /webhooks/paypal`
/// - `GET /health`
pub fn app_router(state: WebhookAppState, max_body_bytes: usize) -> Router {
    Router::new()
        .nest("/webhooks", webhook_routes())
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .with_state(state)
}
