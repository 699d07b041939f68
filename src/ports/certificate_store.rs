//! CertificateStore Port - Interface for persisting downloaded certificates.
//!
//! Entries are opaque PEM text keyed by a storage-safe transform of the
//! certificate URL. The store may be shared by concurrent requests and by
//! several processes; a reader must never observe a partially written entry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Errors that can occur during certificate storage operations
#[derive(Debug, thiserror::Error)]
pub enum CertificateStoreError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

/// A cached certificate and when it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCertificate {
    pub pem: String,
    pub stored_at: DateTime<Utc>,
}

/// Port for loading and saving cached certificates
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Load the entry for `key`, or `None` if absent.
    async fn load(&self, key: &str) -> Result<Option<StoredCertificate>, CertificateStoreError>;

    /// Write `pem` under `key`, replacing any previous entry atomically.
    async fn save(&self, key: &str, pem: &str) -> Result<(), CertificateStoreError>;

    /// Remove the entry for `key`. Removing a missing entry is not an error.
    async fn remove(&self, key: &str) -> Result<(), CertificateStoreError>;
}
