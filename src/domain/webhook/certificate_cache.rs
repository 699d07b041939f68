//! Certificate cache - Resolves signing certificates by URL.
//!
//! Certificates are downloaded once per URL and then served from the
//! [`CertificateStore`]. Entries older than the configured TTL are refetched;
//! a stale entry is never served when the refetch fails.
//!
//! ## Concurrency
//!
//! Fetches are serialized per cache key, so concurrent first deliveries
//! signed with the same certificate trigger a single download. The store
//! itself guarantees that readers never see a torn write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use super::errors::WebhookError;
use super::signature::parse_leaf_certificate;
use crate::ports::{CertificateSource, CertificateStore, StoredCertificate};

/// Derives a storage-safe key from a certificate URL.
///
/// Every run of characters outside `[A-Za-z0-9_]` collapses to one `-`.
pub fn cache_key(url: &str) -> String {
    let mut key = String::with_capacity(url.len());
    let mut in_separator_run = false;

    for c in url.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            key.push(c);
            in_separator_run = false;
        } else if !in_separator_run {
            key.push('-');
            in_separator_run = true;
        }
    }

    key
}

/// TTL-aware certificate cache in front of a store and a download source.
pub struct CertificateCache {
    store: Arc<dyn CertificateStore>,
    source: Arc<dyn CertificateSource>,
    ttl: Option<Duration>,
    fetch_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CertificateCache {
    /// Creates a cache whose entries never expire.
    pub fn new(store: Arc<dyn CertificateStore>, source: Arc<dyn CertificateSource>) -> Self {
        Self {
            store,
            source,
            ttl: None,
            fetch_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Sets how long an entry is served before it is refetched.
    ///
    /// `None` keeps entries forever.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the certificate PEM for `url`.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::CertificateFetch` if no fresh entry exists and
    /// the download fails or does not contain a certificate.
    pub async fn resolve(&self, url: &str) -> Result<String, WebhookError> {
        let key = cache_key(url);

        if let Some(pem) = self.lookup(&key).await {
            return Ok(pem);
        }

        let lock = self.fetch_lock(&key)?;
        let _guard = lock.lock().await;

        // Another request may have completed the fetch while we waited.
        if let Some(pem) = self.lookup(&key).await {
            return Ok(pem);
        }

        tracing::debug!(cert_url = %url, "Fetching signing certificate");

        let pem = self.source.fetch(url).await.map_err(|e| {
            tracing::error!(
                category = "certificate_fetch",
                cert_url = %url,
                error = %e,
                "Failed to fetch signing certificate"
            );
            WebhookError::CertificateFetch(e.to_string())
        })?;

        if let Err(e) = parse_leaf_certificate(&pem) {
            tracing::error!(
                category = "certificate_fetch",
                cert_url = %url,
                error = %e,
                "Certificate endpoint returned something that is not a certificate"
            );
            return Err(WebhookError::CertificateFetch(format!(
                "response is not a certificate: {}",
                e
            )));
        }

        if let Err(e) = self.store.save(&key, &pem).await {
            tracing::warn!(cache_key = %key, error = %e, "Failed to persist certificate");
        }

        Ok(pem)
    }

    /// Drops the cached entry for `url`.
    pub async fn invalidate(&self, url: &str) -> Result<(), WebhookError> {
        let key = cache_key(url);
        self.store
            .remove(&key)
            .await
            .map_err(|e| WebhookError::Storage(e.to_string()))
    }

    /// Returns a fresh cached entry; unreadable entries count as misses.
    async fn lookup(&self, key: &str) -> Option<String> {
        match self.store.load(key).await {
            Ok(Some(stored)) if self.is_fresh(&stored) => Some(stored.pem),
            Ok(Some(_)) => {
                tracing::debug!(cache_key = %key, "Cached certificate expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Failed to read cached certificate");
                None
            }
        }
    }

    fn is_fresh(&self, stored: &StoredCertificate) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => {
                let age = (Utc::now() - stored.stored_at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                age <= ttl
            }
        }
    }

    fn fetch_lock(&self, key: &str) -> Result<Arc<tokio::sync::Mutex<()>>, WebhookError> {
        let mut locks = self
            .fetch_locks
            .lock()
            .map_err(|_| WebhookError::Storage("certificate lock table poisoned".to_string()))?;
        Ok(locks.entry(key.to_string()).or_default().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::certificates::InMemoryCertificateStore;
    use crate::domain::webhook::signature::fixtures::{OTHER_CERT, SIGNING_CERT};
    use crate::ports::CertificateFetchError;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CERT_URL: &str = "https://api.paypal.com/v1/notifications/certs/CERT-360caa42-fca2a594-a5cafa77";

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    /// Source that counts fetches and returns a fixed response.
    struct MockSource {
        response: Result<String, CertificateFetchError>,
        delay: Option<Duration>,
        fetches: AtomicUsize,
    }

    impl MockSource {
        fn serving(pem: &str) -> Self {
            Self {
                response: Ok(pem.to_string()),
                delay: None,
                fetches: AtomicUsize::new(0),
            }
        }

        fn failing(error: CertificateFetchError) -> Self {
            Self {
                response: Err(error),
                delay: None,
                fetches: AtomicUsize::new(0),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CertificateSource for MockSource {
        async fn fetch(&self, _url: &str) -> Result<String, CertificateFetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.response.clone()
        }
    }

    fn cache_with(
        source: Arc<MockSource>,
    ) -> (CertificateCache, Arc<InMemoryCertificateStore>) {
        let store = Arc::new(InMemoryCertificateStore::new());
        let cache = CertificateCache::new(store.clone(), source);
        (cache, store)
    }

    // ══════════════════════════════════════════════════════════════
    // Cache Key Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn cache_key_collapses_non_word_runs() {
        assert_eq!(
            cache_key("https://api.paypal.com/v1/certs/CERT-1"),
            "https-api-paypal-com-v1-certs-CERT-1"
        );
    }

    #[test]
    fn cache_key_keeps_underscores() {
        assert_eq!(cache_key("a_b//c"), "a_b-c");
    }

    #[test]
    fn cache_key_is_deterministic() {
        assert_eq!(cache_key(CERT_URL), cache_key(CERT_URL));
    }

    proptest! {
        #[test]
        fn cache_key_is_storage_safe(url in ".{0,200}") {
            let key = cache_key(&url);

            prop_assert!(key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
            prop_assert!(!key.contains("--"));
            prop_assert!(!key.contains('/'));
            prop_assert!(!key.contains('.'));
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Resolve Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn miss_fetches_and_persists_verbatim() {
        let source = Arc::new(MockSource::serving(SIGNING_CERT));
        let (cache, store) = cache_with(source.clone());

        let pem = cache.resolve(CERT_URL).await.unwrap();

        assert_eq!(pem, SIGNING_CERT);
        assert_eq!(source.fetch_count(), 1);
        let stored = store.load(&cache_key(CERT_URL)).await.unwrap().unwrap();
        assert_eq!(stored.pem, SIGNING_CERT);
    }

    #[tokio::test]
    async fn second_resolve_is_a_cache_hit() {
        let source = Arc::new(MockSource::serving(SIGNING_CERT));
        let (cache, _store) = cache_with(source.clone());

        cache.resolve(CERT_URL).await.unwrap();
        let pem = cache.resolve(CERT_URL).await.unwrap();

        assert_eq!(pem, SIGNING_CERT);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn existing_entry_is_served_without_fetch() {
        let source = Arc::new(MockSource::failing(CertificateFetchError::Timeout));
        let (cache, store) = cache_with(source.clone());
        store.save(&cache_key(CERT_URL), OTHER_CERT).await.unwrap();

        let pem = cache.resolve(CERT_URL).await.unwrap();

        assert_eq!(pem, OTHER_CERT);
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_without_entry_is_certificate_fetch_error() {
        let source = Arc::new(MockSource::failing(CertificateFetchError::Status(503)));
        let (cache, store) = cache_with(source.clone());

        let result = cache.resolve(CERT_URL).await;

        assert!(matches!(result, Err(WebhookError::CertificateFetch(_))));
        assert!(store.load(&cache_key(CERT_URL)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_certificate_body_is_not_cached() {
        let source = Arc::new(MockSource::serving("<html>maintenance</html>"));
        let (cache, store) = cache_with(source.clone());

        let result = cache.resolve(CERT_URL).await;

        assert!(matches!(result, Err(WebhookError::CertificateFetch(_))));
        assert!(store.load(&cache_key(CERT_URL)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let source = Arc::new(MockSource::serving(""));
        let (cache, _store) = cache_with(source);

        assert!(cache.resolve(CERT_URL).await.is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // TTL Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let source = Arc::new(MockSource::serving(SIGNING_CERT));
        let store = Arc::new(InMemoryCertificateStore::new());
        store
            .insert_with_timestamp(
                &cache_key(CERT_URL),
                OTHER_CERT,
                Utc::now() - chrono::Duration::hours(2),
            )
            .await;
        let cache = CertificateCache::new(store.clone(), source.clone())
            .with_ttl(Some(Duration::from_secs(3600)));

        let pem = cache.resolve(CERT_URL).await.unwrap();

        assert_eq!(pem, SIGNING_CERT);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_not_served_when_refetch_fails() {
        let source = Arc::new(MockSource::failing(CertificateFetchError::Timeout));
        let store = Arc::new(InMemoryCertificateStore::new());
        store
            .insert_with_timestamp(
                &cache_key(CERT_URL),
                SIGNING_CERT,
                Utc::now() - chrono::Duration::days(2),
            )
            .await;
        let cache =
            CertificateCache::new(store, source).with_ttl(Some(Duration::from_secs(86400)));

        let result = cache.resolve(CERT_URL).await;

        assert!(matches!(result, Err(WebhookError::CertificateFetch(_))));
    }

    #[tokio::test]
    async fn entry_within_ttl_is_served() {
        let source = Arc::new(MockSource::serving(OTHER_CERT));
        let store = Arc::new(InMemoryCertificateStore::new());
        store
            .insert_with_timestamp(
                &cache_key(CERT_URL),
                SIGNING_CERT,
                Utc::now() - chrono::Duration::minutes(5),
            )
            .await;
        let cache = CertificateCache::new(store, source.clone())
            .with_ttl(Some(Duration::from_secs(3600)));

        assert_eq!(cache.resolve(CERT_URL).await.unwrap(), SIGNING_CERT);
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn no_ttl_serves_old_entries() {
        let source = Arc::new(MockSource::serving(OTHER_CERT));
        let store = Arc::new(InMemoryCertificateStore::new());
        store
            .insert_with_timestamp(
                &cache_key(CERT_URL),
                SIGNING_CERT,
                Utc::now() - chrono::Duration::days(400),
            )
            .await;
        let cache = CertificateCache::new(store, source.clone());

        assert_eq!(cache.resolve(CERT_URL).await.unwrap(), SIGNING_CERT);
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let source = Arc::new(MockSource::serving(SIGNING_CERT));
        let (cache, _store) = cache_with(source.clone());

        cache.resolve(CERT_URL).await.unwrap();
        cache.invalidate(CERT_URL).await.unwrap();
        cache.resolve(CERT_URL).await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }

    // ══════════════════════════════════════════════════════════════
    // Concurrency Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn concurrent_first_resolves_fetch_once() {
        let source = Arc::new(MockSource::serving(SIGNING_CERT).slow(Duration::from_millis(50)));
        let (cache, _store) = cache_with(source.clone());
        let cache = Arc::new(cache);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.resolve(CERT_URL).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), SIGNING_CERT);
        }
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn different_urls_are_cached_separately() {
        let source = Arc::new(MockSource::serving(SIGNING_CERT));
        let (cache, _store) = cache_with(source.clone());

        cache.resolve("https://api.paypal.com/certs/A").await.unwrap();
        cache.resolve("https://api.paypal.com/certs/B").await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }
}
