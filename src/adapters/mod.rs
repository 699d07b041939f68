//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `certificates` - Certificate download and caching (HTTP, file, in-memory)
//! - `events` - Processed-event tracking
//! - `handlers` - Default business handlers
//! - `http` - Axum routes for the webhook endpoint

pub mod certificates;
pub mod events;
pub mod handlers;
pub mod http;
