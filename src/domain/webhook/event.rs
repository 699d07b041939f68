//! PayPal webhook event types.
//!
//! Only the fields the dispatcher needs are captured; the resource stays an
//! opaque JSON object owned by the business handlers.

use serde::{Deserialize, Serialize};

use super::errors::WebhookError;

/// PayPal webhook event body (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaypalEvent {
    /// Event identifier (WH-xxx format), stable across redeliveries.
    pub id: String,

    /// Event type tag, e.g. "BILLING.SUBSCRIPTION.ACTIVATED".
    pub event_type: String,

    /// The object the event is about (subscription, sale, ...).
    pub resource: serde_json::Value,

    /// Kind of resource, e.g. "subscription" or "sale".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Human readable summary supplied by PayPal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// When PayPal created the event (RFC 3339, kept verbatim).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_version: Option<String>,
}

impl PaypalEvent {
    /// Parses an event from the raw delivery body.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::MalformedDelivery` if the body is not JSON,
    /// lacks `id`/`event_type`/`resource`, or `resource` is not an object.
    pub fn from_slice(raw_body: &[u8]) -> Result<Self, WebhookError> {
        let event: PaypalEvent = serde_json::from_slice(raw_body)
            .map_err(|e| WebhookError::MalformedDelivery(e.to_string()))?;

        if !event.resource.is_object() {
            return Err(WebhookError::MalformedDelivery(
                "resource must be a JSON object".to_string(),
            ));
        }

        Ok(event)
    }

    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> PaypalEventType {
        PaypalEventType::parse(&self.event_type)
    }

    /// The `id` field of the resource, when present.
    pub fn resource_id(&self) -> Option<&str> {
        self.resource.get("id").and_then(|v| v.as_str())
    }
}

/// Event types we route to a handler.
///
/// `Unknown` keeps the raw tag so newly introduced PayPal events are
/// logged and acknowledged instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaypalEventType {
    /// A subscription payment was captured.
    PaymentSaleCompleted,
    /// A subscription payment was denied.
    PaymentSaleDenied,
    /// Subscription created, not yet active.
    SubscriptionCreated,
    /// Subscription activated; access may be granted.
    SubscriptionActivated,
    /// Plan or billing details changed.
    SubscriptionUpdated,
    /// Subscription reached the end of its billing cycles.
    SubscriptionExpired,
    /// Subscription cancelled by the buyer or merchant.
    SubscriptionCancelled,
    /// Subscription suspended, usually after failed payments.
    SubscriptionSuspended,
    /// Any tag we do not handle.
    Unknown(String),
}

impl PaypalEventType {
    /// Every handled variant, in declaration order.
    pub const HANDLED: [PaypalEventType; 8] = [
        Self::PaymentSaleCompleted,
        Self::PaymentSaleDenied,
        Self::SubscriptionCreated,
        Self::SubscriptionActivated,
        Self::SubscriptionUpdated,
        Self::SubscriptionExpired,
        Self::SubscriptionCancelled,
        Self::SubscriptionSuspended,
    ];

    /// Parse event type from the PayPal tag.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "PAYMENT.SALE.COMPLETED" => Self::PaymentSaleCompleted,
            "PAYMENT.SALE.DENIED" => Self::PaymentSaleDenied,
            "BILLING.SUBSCRIPTION.CREATED" => Self::SubscriptionCreated,
            "BILLING.SUBSCRIPTION.ACTIVATED" => Self::SubscriptionActivated,
            "BILLING.SUBSCRIPTION.UPDATED" => Self::SubscriptionUpdated,
            "BILLING.SUBSCRIPTION.EXPIRED" => Self::SubscriptionExpired,
            "BILLING.SUBSCRIPTION.CANCELLED" => Self::SubscriptionCancelled,
            "BILLING.SUBSCRIPTION.SUSPENDED" => Self::SubscriptionSuspended,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Convert back to the PayPal tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentSaleCompleted => "PAYMENT.SALE.COMPLETED",
            Self::PaymentSaleDenied => "PAYMENT.SALE.DENIED",
            Self::SubscriptionCreated => "BILLING.SUBSCRIPTION.CREATED",
            Self::SubscriptionActivated => "BILLING.SUBSCRIPTION.ACTIVATED",
            Self::SubscriptionUpdated => "BILLING.SUBSCRIPTION.UPDATED",
            Self::SubscriptionExpired => "BILLING.SUBSCRIPTION.EXPIRED",
            Self::SubscriptionCancelled => "BILLING.SUBSCRIPTION.CANCELLED",
            Self::SubscriptionSuspended => "BILLING.SUBSCRIPTION.SUSPENDED",
            Self::Unknown(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

/// A parsed event together with the outcome of signature verification.
///
/// Only events with `signature_verified == true` may be dispatched.
#[derive(Debug, Clone)]
pub struct VerifiedEvent {
    pub event: PaypalEvent,
    pub signature_verified: bool,
}

impl VerifiedEvent {
    pub fn verified(event: PaypalEvent) -> Self {
        Self {
            event,
            signature_verified: true,
        }
    }

    pub fn unverified(event: PaypalEvent) -> Self {
        Self {
            event,
            signature_verified: false,
        }
    }
}

/// Builder for creating test PaypalEvent instances.
#[cfg(test)]
pub struct PaypalEventBuilder {
    id: String,
    event_type: String,
    resource: serde_json::Value,
}

#[cfg(test)]
impl Default for PaypalEventBuilder {
    fn default() -> Self {
        Self {
            id: "WH-TEST-123".to_string(),
            event_type: "BILLING.SUBSCRIPTION.ACTIVATED".to_string(),
            resource: serde_json::json!({ "id": "I-SUB123" }),
        }
    }
}

#[cfg(test)]
impl PaypalEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn resource(mut self, resource: serde_json::Value) -> Self {
        self.resource = resource;
        self
    }

    pub fn build(self) -> PaypalEvent {
        PaypalEvent {
            id: self.id,
            event_type: self.event_type,
            resource: self.resource,
            resource_type: None,
            summary: None,
            create_time: None,
            event_version: None,
        }
    }

    pub fn verified(self) -> VerifiedEvent {
        VerifiedEvent::verified(self.build())
    }
}
