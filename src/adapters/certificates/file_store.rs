//! File-based Certificate Store Adapter
//!
//! Stores each certificate as `<key>.pem` under a base directory. Writes go
//! to a uniquely named temporary file first and are renamed into place, so
//! concurrent readers (in this or another process) see either the old entry
//! or the new one, never a partial file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use crate::ports::{CertificateStore, CertificateStoreError, StoredCertificate};

/// File-based storage for downloaded certificates
#[derive(Debug, Clone)]
pub struct FileCertificateStore {
    base_path: PathBuf,
}

impl FileCertificateStore {
    /// Create a new file store rooted at `base_path`.
    ///
    /// The directory is created on first write.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, CertificateStoreError> {
        validate_key(key)?;
        Ok(self.base_path.join(format!("{}.pem", key)))
    }

    async fn ensure_dir(&self) -> Result<(), CertificateStoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| CertificateStoreError::IoError(e.to_string()))
    }
}

/// Keys come from `cache_key`; anything else could escape the directory.
fn validate_key(key: &str) -> Result<(), CertificateStoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(CertificateStoreError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl CertificateStore for FileCertificateStore {
    async fn load(&self, key: &str) -> Result<Option<StoredCertificate>, CertificateStoreError> {
        let path = self.entry_path(key)?;

        let pem = match fs::read_to_string(&path).await {
            Ok(pem) => pem,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CertificateStoreError::IoError(e.to_string())),
        };

        let modified = fs::metadata(&path)
            .await
            .and_then(|meta| meta.modified())
            .map_err(|e| CertificateStoreError::IoError(e.to_string()))?;

        Ok(Some(StoredCertificate {
            pem,
            stored_at: DateTime::<Utc>::from(modified),
        }))
    }

    async fn save(&self, key: &str, pem: &str) -> Result<(), CertificateStoreError> {
        let path = self.entry_path(key)?;
        self.ensure_dir().await?;

        let temp_path = self
            .base_path
            .join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4()));

        fs::write(&temp_path, pem)
            .await
            .map_err(|e| CertificateStoreError::IoError(e.to_string()))?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(CertificateStoreError::IoError(e.to_string()));
        }

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CertificateStoreError> {
        let path = self.entry_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CertificateStoreError::IoError(e.to_string())),
        }
    }
}
