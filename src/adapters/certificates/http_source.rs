//! HTTP certificate source backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{CertificateFetchError, CertificateSource};

/// Certificates are a few kilobytes; anything larger is not a certificate.
const MAX_CERTIFICATE_BYTES: usize = 64 * 1024;

/// Downloads certificates with a bounded request time.
#[derive(Debug, Clone)]
pub struct HttpCertificateSource {
    http_client: reqwest::Client,
}

impl HttpCertificateSource {
    /// Create a source whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, CertificateFetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CertificateFetchError::Request(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl CertificateSource for HttpCertificateSource {
    async fn fetch(&self, url: &str) -> Result<String, CertificateFetchError> {
        let mut response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                CertificateFetchError::Timeout
            } else {
                CertificateFetchError::Request(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(CertificateFetchError::Status(response.status().as_u16()));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() {
                CertificateFetchError::Timeout
            } else {
                CertificateFetchError::Body(e.to_string())
            }
        })? {
            if body.len() + chunk.len() > MAX_CERTIFICATE_BYTES {
                return Err(CertificateFetchError::Body(format!(
                    "response exceeds {} bytes",
                    MAX_CERTIFICATE_BYTES
                )));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(cert_url = %url, bytes = body.len(), "Fetched certificate");

        String::from_utf8(body).map_err(|e| CertificateFetchError::Body(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    /// Serves a tiny certificate endpoint on an ephemeral port.
    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/certs/good", get(|| async { "-----BEGIN CERTIFICATE-----\nAA==\n-----END CERTIFICATE-----\n" }))
            .route("/certs/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route("/certs/huge", get(|| async { "A".repeat(MAX_CERTIFICATE_BYTES + 1) }))
            .route(
                "/certs/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn returns_body_verbatim() {
        let base = spawn_server().await;
        let source = HttpCertificateSource::new(Duration::from_secs(5)).unwrap();

        let body = source.fetch(&format!("{}/certs/good", base)).await.unwrap();

        assert_eq!(
            body,
            "-----BEGIN CERTIFICATE-----\nAA==\n-----END CERTIFICATE-----\n"
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = spawn_server().await;
        let source = HttpCertificateSource::new(Duration::from_secs(5)).unwrap();

        let result = source.fetch(&format!("{}/certs/missing", base)).await;

        assert_eq!(result, Err(CertificateFetchError::Status(404)));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let base = spawn_server().await;
        let source = HttpCertificateSource::new(Duration::from_secs(5)).unwrap();

        let result = source.fetch(&format!("{}/certs/huge", base)).await;

        assert!(matches!(result, Err(CertificateFetchError::Body(_))));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let base = spawn_server().await;
        let source = HttpCertificateSource::new(Duration::from_millis(200)).unwrap();

        let result = source.fetch(&format!("{}/certs/slow", base)).await;

        assert_eq!(result, Err(CertificateFetchError::Timeout));
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let source = HttpCertificateSource::new(Duration::from_secs(2)).unwrap();

        let result = source.fetch("http://127.0.0.1:1/certs/none").await;

        assert!(matches!(result, Err(CertificateFetchError::Request(_))));
    }
}
