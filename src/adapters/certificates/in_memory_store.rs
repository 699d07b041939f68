//! In-Memory Certificate Store Adapter
//!
//! Keeps certificates in a process-local map. Useful for testing and for
//! single-instance deployments without a writable disk.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::ports::{CertificateStore, CertificateStoreError, StoredCertificate};

/// In-memory storage for downloaded certificates
#[derive(Debug, Clone, Default)]
pub struct InMemoryCertificateStore {
    entries: Arc<RwLock<HashMap<String, StoredCertificate>>>,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry with an explicit write time (for TTL tests).
    pub async fn insert_with_timestamp(&self, key: &str, pem: &str, stored_at: DateTime<Utc>) {
        self.entries.write().await.insert(
            key.to_string(),
            StoredCertificate {
                pem: pem.to_string(),
                stored_at,
            },
        );
    }

    /// Get the number of stored certificates
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CertificateStore for InMemoryCertificateStore {
    async fn load(&self, key: &str) -> Result<Option<StoredCertificate>, CertificateStoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, pem: &str) -> Result<(), CertificateStoreError> {
        self.insert_with_timestamp(key, pem, Utc::now()).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CertificateStoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
