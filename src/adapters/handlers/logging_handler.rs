//! Default business handler that records each event in the log.
//!
//! Deployments replace this with handlers that update subscriptions and
//! payment history; the webhook core only depends on the trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::webhook::{HandlerError, PaypalEvent, PaypalEventHandler};

/// Logs the resource id of every handled event, plus the amount for payments.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventHandler;

impl LoggingEventHandler {
    pub fn new() -> Self {
        Self
    }

    fn log_subscription(&self, action: &'static str, event: &PaypalEvent) {
        let status = subscription_status(&event.resource).unwrap_or("unknown");
        tracing::info!(
            event_id = %event.id,
            subscription_id = event.resource_id().unwrap_or("unknown"),
            status,
            "Subscription {}",
            action
        );
    }
}

fn subscription_status(resource: &Value) -> Option<&str> {
    resource.get("status").and_then(Value::as_str)
}

/// Amount and currency of a sale resource.
///
/// Sale resources carry `amount.total`/`amount.currency`, newer payment
/// resources `amount.value`/`amount.currency_code`.
pub(crate) fn payment_amount(resource: &Value) -> Option<(&str, &str)> {
    let amount = resource.get("amount")?;
    let value = amount
        .get("value")
        .or_else(|| amount.get("total"))
        .and_then(Value::as_str)?;
    let currency = amount
        .get("currency_code")
        .or_else(|| amount.get("currency"))
        .and_then(Value::as_str)?;
    Some((value, currency))
}

#[async_trait]
impl PaypalEventHandler for LoggingEventHandler {
    async fn payment_completed(&self, event: &PaypalEvent) -> Result<(), HandlerError> {
        let payment_id = event.resource_id().unwrap_or("unknown");
        match payment_amount(&event.resource) {
            Some((value, currency)) => tracing::info!(
                event_id = %event.id,
                payment_id,
                amount = value,
                currency,
                "Payment completed"
            ),
            None => tracing::info!(event_id = %event.id, payment_id, "Payment completed"),
        }
        Ok(())
    }

    async fn payment_denied(&self, event: &PaypalEvent) -> Result<(), HandlerError> {
        tracing::warn!(
            event_id = %event.id,
            payment_id = event.resource_id().unwrap_or("unknown"),
            "Payment denied"
        );
        Ok(())
    }

    async fn subscription_created(&self, event: &PaypalEvent) -> Result<(), HandlerError> {
        self.log_subscription("created", event);
        Ok(())
    }

    async fn subscription_activated(&self, event: &PaypalEvent) -> Result<(), HandlerError> {
        self.log_subscription("activated", event);
        Ok(())
    }

    async fn subscription_updated(&self, event: &PaypalEvent) -> Result<(), HandlerError> {
        self.log_subscription("updated", event);
        Ok(())
    }

    async fn subscription_expired(&self, event: &PaypalEvent) -> Result<(), HandlerError> {
        self.log_subscription("expired", event);
        Ok(())
    }

    async fn subscription_cancelled(&self, event: &PaypalEvent) -> Result<(), HandlerError> {
        self.log_subscription("cancelled", event);
        Ok(())
    }

    async fn subscription_suspended(&self, event: &PaypalEvent) -> Result<(), HandlerError> {
        self.log_subscription("suspended", event);
        Ok(())
    }
}
