//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Certificate Ports
//!
//! - `CertificateSource` - Downloads signing certificates by URL
//! - `CertificateStore` - Persists downloaded certificates
//!
//! ## Webhook Ports
//!
//! - `WebhookEventRepository` - PayPal webhook idempotency tracking

mod certificate_source;
mod certificate_store;
mod webhook_event_repository;

pub use certificate_source::{CertificateFetchError, CertificateSource};
pub use certificate_store::{CertificateStore, CertificateStoreError, StoredCertificate};
pub use webhook_event_repository::{
    ProcessingResult, RepositoryError, SaveResult, WebhookEventRecord, WebhookEventRepository,
    WebhookResult,
};
