//! Webhook processor - Orchestrates idempotent event handling.
//!
//! ## Design
//!
//! The processor follows these steps:
//! 1. Refuse events whose signature was not verified
//! 2. Check if the event was already processed (idempotency)
//! 3. Dispatch to the business handler based on event type
//! 4. Record the processing result (success, ignored, or failed)
//!
//! ## Race Condition Handling
//!
//! Redeliveries of one event inside this process are serialized on a
//! per-event-id lock, so the second one finds the first one's record.
//! Across processes the repository's atomic insert decides: the loser gets
//! `AlreadyExists` and reports `AlreadyProcessed` unless its own handler failed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::dispatcher::{DispatchOutcome, EventDispatcher};
use super::errors::WebhookError;
use super::event::VerifiedEvent;
use crate::ports::{
    RepositoryError, SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};

/// Processes verified events with at-most-once handler invocation per event id
/// within one process.
pub struct IdempotentWebhookProcessor {
    repository: Arc<dyn WebhookEventRepository>,
    dispatcher: EventDispatcher,
    event_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl IdempotentWebhookProcessor {
    pub fn new(repository: Arc<dyn WebhookEventRepository>, dispatcher: EventDispatcher) -> Self {
        Self {
            repository,
            dispatcher,
            event_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Process a verified event exactly once.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Processed)` - Event was handled or deliberately ignored
    /// - `Ok(WebhookResult::AlreadyProcessed)` - Event id was seen before
    /// - `Err(_)` - Event unverified, handler failed, or the repository is unavailable
    pub async fn process(
        &self,
        verified: VerifiedEvent,
        transmission_id: &str,
    ) -> Result<WebhookResult, WebhookError> {
        if !verified.signature_verified {
            return Err(WebhookError::UnverifiedEvent);
        }

        let event_id = verified.event.id.clone();
        let lock = self.event_lock(&event_id)?;
        let result = {
            let _guard = lock.lock().await;
            self.process_exclusive(&verified, transmission_id).await
        };
        self.release_event_lock(&event_id, lock);
        result
    }

    /// Check, dispatch and record while holding the event id's lock.
    async fn process_exclusive(
        &self,
        verified: &VerifiedEvent,
        transmission_id: &str,
    ) -> Result<WebhookResult, WebhookError> {
        let event = &verified.event;

        if self.repository.find_by_event_id(&event.id).await?.is_some() {
            tracing::info!(
                category = "duplicate_delivery",
                event_id = %event.id,
                transmission_id = %transmission_id,
                "Event already processed"
            );
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let result = self.dispatcher.dispatch(verified).await;

        let record = match &result {
            Ok(DispatchOutcome::Handled(_)) => {
                WebhookEventRecord::success(&event.id, &event.event_type)
            }
            Ok(DispatchOutcome::Unhandled(tag)) => WebhookEventRecord::ignored(
                &event.id,
                &event.event_type,
                format!("No handler for event type: {}", tag),
            ),
            Err(e) => WebhookEventRecord::failed(&event.id, &event.event_type, e.to_string()),
        }
        .with_transmission_id(transmission_id);

        match self.repository.save(record).await? {
            SaveResult::Inserted => result.map(|_| WebhookResult::Processed),
            SaveResult::AlreadyExists => {
                tracing::info!(
                    category = "duplicate_delivery",
                    event_id = %event.id,
                    transmission_id = %transmission_id,
                    "Concurrent delivery recorded the event first"
                );
                result.map(|_| WebhookResult::AlreadyProcessed)
            }
        }
    }

    fn event_lock(&self, event_id: &str) -> Result<Arc<tokio::sync::Mutex<()>>, WebhookError> {
        let mut locks = self
            .event_locks
            .lock()
            .map_err(|_| WebhookError::Storage("event lock table poisoned".to_string()))?;
        Ok(locks.entry(event_id.to_string()).or_default().clone())
    }

    /// Drops the table entry once no other delivery of the event is waiting.
    fn release_event_lock(&self, event_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        if let Ok(mut locks) = self.event_locks.lock() {
            // One reference in the table, one held here.
            if Arc::strong_count(&lock) == 2 {
                locks.remove(event_id);
            }
        }
    }

    /// Forget records processed before `cutoff`, returning how many were removed.
    pub async fn prune_before(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64, WebhookError> {
        Ok(self.repository.delete_before(cutoff).await?)
    }
}

impl From<RepositoryError> for WebhookError {
    fn from(err: RepositoryError) -> Self {
        WebhookError::Storage(err.to_string())
    }
}
