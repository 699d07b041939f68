//! HTTP adapters - REST API implementations.

pub mod webhook;

pub use webhook::{app_router, webhook_routes, WebhookAppState};
