//! Processed-event tracking adapters.
//!
//! - `InMemoryWebhookEventRepository` - Process-local idempotency records

mod in_memory_webhook_repository;

pub use in_memory_webhook_repository::InMemoryWebhookEventRepository;
