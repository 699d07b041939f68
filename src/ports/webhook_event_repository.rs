//! WebhookEventRepository port - Interface for tracking processed PayPal events.
//!
//! PayPal redelivers the same event (same `id`, new transmission id) when it
//! believes a delivery was lost. Recording each processed event id lets the
//! processor invoke business handlers at most once per event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure of the underlying record store.
#[derive(Debug, Error)]
#[error("Webhook event repository error: {0}")]
pub struct RepositoryError(pub String);

/// How a processed event ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingResult {
    /// A handler ran and succeeded.
    Success,
    /// Acknowledged without running a handler (unknown type).
    Ignored { reason: String },
    /// A handler ran and failed.
    Failed { error: String },
}

impl ProcessingResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingResult::Success => "success",
            ProcessingResult::Ignored { .. } => "ignored",
            ProcessingResult::Failed { .. } => "failed",
        }
    }
}

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// PayPal event ID (WH-xxx format).
    pub event_id: String,

    /// PayPal event type tag.
    pub event_type: String,

    /// Transmission that carried the processed delivery.
    pub transmission_id: Option<String>,

    /// When the event was processed.
    pub processed_at: DateTime<Utc>,

    pub result: ProcessingResult,
}

impl WebhookEventRecord {
    pub fn new(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        result: ProcessingResult,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            transmission_id: None,
            processed_at: Utc::now(),
            result,
        }
    }

    /// Creates a new success record.
    pub fn success(event_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self::new(event_id, event_type, ProcessingResult::Success)
    }

    /// Creates a new ignored record.
    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            event_id,
            event_type,
            ProcessingResult::Ignored {
                reason: reason.into(),
            },
        )
    }

    /// Creates a new failure record.
    pub fn failed(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::new(
            event_id,
            event_type,
            ProcessingResult::Failed {
                error: error.into(),
            },
        )
    }

    pub fn with_transmission_id(mut self, transmission_id: impl Into<String>) -> Self {
        self.transmission_id = Some(transmission_id.into());
        self
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
///
/// `save` must be atomic per event id so that concurrent deliveries of the
/// same event cannot both report `Inserted`.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Find a previously processed event by its PayPal event ID.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, RepositoryError>;

    /// Insert a record unless one exists for the same event id.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, RepositoryError>;

    /// Delete records processed before `timestamp`, returning how many.
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

/// Result of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResult {
    /// Event was processed successfully.
    Processed,
    /// Event was already processed (idempotent skip).
    AlreadyProcessed,
}
