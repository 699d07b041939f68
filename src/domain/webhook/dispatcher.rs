//! Event dispatcher - Routes verified events to business handlers.
//!
//! Routing is a closed match over [`PaypalEventType`]; supporting a new
//! PayPal event means adding one variant and one handler method. Tags we
//! do not know are logged and acknowledged without invoking anything.
//!
//! A handler failure (error or panic) is caught here and surfaced as
//! `WebhookError::HandlerFailure` so it can never reach the transport.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use thiserror::Error;

use super::errors::WebhookError;
use super::event::{PaypalEvent, PaypalEventType, VerifiedEvent};

/// Error returned by a business handler.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Business routines, one per handled event type.
///
/// Implementations are external collaborators: they decide what a verified
/// event means for subscriptions and payments. Each method is invoked at
/// most once per processed event.
#[async_trait]
pub trait PaypalEventHandler: Send + Sync {
    /// `PAYMENT.SALE.COMPLETED`
    async fn payment_completed(&self, event: &PaypalEvent) -> Result<(), HandlerError>;

    /// `PAYMENT.SALE.DENIED`
    async fn payment_denied(&self, event: &PaypalEvent) -> Result<(), HandlerError>;

    /// `BILLING.SUBSCRIPTION.CREATED`
    async fn subscription_created(&self, event: &PaypalEvent) -> Result<(), HandlerError>;

    /// `BILLING.SUBSCRIPTION.ACTIVATED`
    async fn subscription_activated(&self, event: &PaypalEvent) -> Result<(), HandlerError>;

    /// `BILLING.SUBSCRIPTION.UPDATED`
    async fn subscription_updated(&self, event: &PaypalEvent) -> Result<(), HandlerError>;

    /// `BILLING.SUBSCRIPTION.EXPIRED`
    async fn subscription_expired(&self, event: &PaypalEvent) -> Result<(), HandlerError>;

    /// `BILLING.SUBSCRIPTION.CANCELLED`
    async fn subscription_cancelled(&self, event: &PaypalEvent) -> Result<(), HandlerError>;

    /// `BILLING.SUBSCRIPTION.SUSPENDED`
    async fn subscription_suspended(&self, event: &PaypalEvent) -> Result<(), HandlerError>;
}

/// What the dispatcher did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The matching handler ran and succeeded.
    Handled(PaypalEventType),
    /// No handler exists for this tag; nothing was invoked.
    Unhandled(String),
}

/// Routes verified events to a [`PaypalEventHandler`].
#[derive(Clone)]
pub struct EventDispatcher {
    handler: Arc<dyn PaypalEventHandler>,
}

impl EventDispatcher {
    pub fn new(handler: Arc<dyn PaypalEventHandler>) -> Self {
        Self { handler }
    }

    /// Dispatch a verified event to exactly one handler routine.
    ///
    /// # Errors
    ///
    /// - `UnverifiedEvent` - the event's signature was not verified
    /// - `HandlerFailure` - the routine returned an error or panicked
    pub async fn dispatch(&self, verified: &VerifiedEvent) -> Result<DispatchOutcome, WebhookError> {
        if !verified.signature_verified {
            return Err(WebhookError::UnverifiedEvent);
        }

        let event = &verified.event;
        let event_type = event.parsed_type();
        let handler = self.handler.as_ref();

        let invocation = match &event_type {
            PaypalEventType::PaymentSaleCompleted => handler.payment_completed(event),
            PaypalEventType::PaymentSaleDenied => handler.payment_denied(event),
            PaypalEventType::SubscriptionCreated => handler.subscription_created(event),
            PaypalEventType::SubscriptionActivated => handler.subscription_activated(event),
            PaypalEventType::SubscriptionUpdated => handler.subscription_updated(event),
            PaypalEventType::SubscriptionExpired => handler.subscription_expired(event),
            PaypalEventType::SubscriptionCancelled => handler.subscription_cancelled(event),
            PaypalEventType::SubscriptionSuspended => handler.subscription_suspended(event),
            PaypalEventType::Unknown(tag) => {
                tracing::info!(
                    category = "unhandled_event_type",
                    event_id = %event.id,
                    event_type = %tag,
                    "Unhandled event type"
                );
                return Ok(DispatchOutcome::Unhandled(tag.clone()));
            }
        };

        tracing::debug!(event_id = %event.id, event_type = %event_type.as_str(), "Dispatching event");

        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(Ok(())) => Ok(DispatchOutcome::Handled(event_type)),
            Ok(Err(e)) => Err(WebhookError::HandlerFailure {
                event_type: event.event_type.clone(),
                reason: e.to_string(),
            }),
            Err(panic) => Err(WebhookError::HandlerFailure {
                event_type: event.event_type.clone(),
                reason: format!("handler panicked: {}", panic_message(&*panic)),
            }),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
