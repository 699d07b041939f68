//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod webhook;

pub use webhook::{
    HandlePaypalWebhookHandler, WebhookOutcome, WebhookStage, WebhookVerificationSettings,
};
