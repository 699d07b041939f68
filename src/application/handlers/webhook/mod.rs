//! Webhook handlers - Inbound PayPal notifications.

mod handle_paypal_webhook;

pub use handle_paypal_webhook::{
    HandlePaypalWebhookHandler, WebhookOutcome, WebhookStage, WebhookVerificationSettings,
};
