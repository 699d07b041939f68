//! HTTP adapter for PayPal webhooks.
//!
//! - `POST /webhooks/paypal` - Handle PayPal webhooks
//! - `GET /health` - Liveness check

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::WebhookAppState;
pub use routes::{app_router, webhook_routes};
