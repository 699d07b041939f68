//! CertificateSource port - Downloads PayPal signing certificates.

use async_trait::async_trait;
use thiserror::Error;

/// Reasons a certificate download failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CertificateFetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("certificate endpoint returned {0}")]
    Status(u16),

    #[error("response body unreadable: {0}")]
    Body(String),
}

/// Port for fetching certificate text by URL.
///
/// Implementations must return the response body verbatim and treat any
/// non-success response as an error.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, CertificateFetchError>;
}
