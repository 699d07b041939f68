//! Application layer - Handlers that orchestrate domain operations and ports.

pub mod handlers;

pub use handlers::{
    HandlePaypalWebhookHandler, WebhookOutcome, WebhookStage, WebhookVerificationSettings,
};
