// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Sources
//!
//! - [`HttpKeySource`] performs one HTTPS GET per call against
//!   `https://{domain}/.well-known/jwks.json`, bounded by a request timeout.
//! - [`CachedKeySource`] wraps any source with a time-bounded cache. The
//!   cache entry is guarded by a single async mutex, so concurrent misses
//!   collapse into one outbound request. Staleness never exceeds the TTL.
//!
//! Fetch failures are [`JwksError`]s, never [`AuthError`](super::AuthError)s:
//! an unreachable identity provider is not a bad token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum spacing between forced refreshes triggered by unknown key ids.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Default timeout for the outbound JWKS request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a failed fetch is reported to later callers instead of retried.
pub const DEFAULT_FAILURE_BACKOFF: Duration = Duration::from_secs(5);

/// A public signing key as published by the identity provider.
///
/// Only the fields needed for RSA verification are kept; anything else in
/// the JWK (`x5c`, `x5t`, `alg`) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    /// Key type, `RSA` for every key this service can use
    pub kty: String,
    /// Key identifier matched against the token header's `kid`
    #[serde(default)]
    pub kid: Option<String>,
    /// Intended usage, normally `sig`
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    /// RSA modulus, base64url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent, base64url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl SigningKey {
    /// Build the RSA verification key, if this record describes one.
    pub fn decoding_key(&self) -> Option<DecodingKey> {
        if self.kty != "RSA" {
            return None;
        }
        let (n, e) = (self.n.as_deref()?, self.e.as_deref()?);
        DecodingKey::from_rsa_components(n, e).ok()
    }
}

/// The identity provider's current signing keys, in published order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKeySet {
    pub keys: Vec<SigningKey>,
}

impl SigningKeySet {
    /// Find the key tagged with `kid`.
    ///
    /// The whole set is scanned; if several keys share the identifier the
    /// last one wins.
    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        self.keys
            .iter()
            .filter(|key| key.kid.as_deref() == Some(kid))
            .last()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Key set fetch failure.
#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    #[error("failed to build JWKS HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("JWKS request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("JWKS endpoint {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("JWKS response from {url} is not a key set: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A cached fetch failure, shared with every caller inside the failure
    /// backoff.
    #[error("JWKS fetch failed: {0}")]
    Shared(#[source] Arc<JwksError>),

    #[error("no signing keys after waiting {waited:?}")]
    TimedOut { waited: Duration },
}

impl JwksError {
    pub fn is_timeout(&self) -> bool {
        match self {
            JwksError::Request { source, .. } => source.is_timeout(),
            JwksError::Shared(err) => err.is_timeout(),
            JwksError::TimedOut { .. } => true,
            _ => false,
        }
    }
}

/// Where signing keys come from.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Current key set, possibly served from a cache.
    async fn fetch(&self) -> Result<Arc<SigningKeySet>, JwksError>;

    /// Re-fetch bypassing any cache, called when a token names a key id the
    /// last fetched set does not contain. `None` means nothing fresher than
    /// the last [`fetch`](Self::fetch) is available, which is always the
    /// case for uncached sources.
    async fn refresh(&self) -> Result<Option<Arc<SigningKeySet>>, JwksError> {
        Ok(None)
    }
}

/// Fetches the key set over HTTP on every call.
#[derive(Clone)]
pub struct HttpKeySource {
    jwks_url: String,
    client: reqwest::Client,
}

impl HttpKeySource {
    /// Create a source for `jwks_url` with a bounded request timeout.
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> Result<Self, JwksError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(JwksError::Client)?;
        Ok(Self {
            jwks_url: jwks_url.into(),
            client,
        })
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    #[instrument(skip(self), fields(url = %self.jwks_url))]
    async fn fetch(&self) -> Result<Arc<SigningKeySet>, JwksError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|source| JwksError::Request {
                url: self.jwks_url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(JwksError::Status {
                url: self.jwks_url.clone(),
                status: response.status(),
            });
        }

        let jwks: SigningKeySet = response.json().await.map_err(|source| JwksError::Decode {
            url: self.jwks_url.clone(),
            source,
        })?;

        debug!(keys = jwks.keys.len(), "fetched signing keys");
        Ok(Arc::new(jwks))
    }
}

/// JWKS cache entry.
struct CacheEntry {
    jwks: Arc<SigningKeySet>,
    fetched_at: Instant,
}

/// Last failed fetch.
struct FailedFetch {
    error: Arc<JwksError>,
    failed_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entry: Option<CacheEntry>,
    failure: Option<FailedFetch>,
}

/// Time-bounded cache in front of another [`KeySource`].
///
/// One fill runs at a time. Callers queued behind a failed fill get that
/// failure back instead of starting their own request, and nobody waits
/// longer than `max_wait` for the lock and the fetch together.
pub struct CachedKeySource<S> {
    inner: S,
    cache_ttl: Duration,
    min_refresh_interval: Duration,
    failure_backoff: Duration,
    max_wait: Duration,
    state: Mutex<CacheState>,
}

impl<S: KeySource> CachedKeySource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            failure_backoff: DEFAULT_FAILURE_BACKOFF,
            max_wait: DEFAULT_FETCH_TIMEOUT,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn with_failure_backoff(mut self, backoff: Duration) -> Self {
        self.failure_backoff = backoff;
        self
    }

    /// Upper bound on how long one caller waits for keys.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Check if JWKS is currently cached and fresh.
    pub async fn is_cached(&self) -> bool {
        let state = self.state.lock().await;
        state
            .entry
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }

    fn recent_failure(&self, state: &CacheState) -> Option<JwksError> {
        state
            .failure
            .as_ref()
            .filter(|failure| failure.failed_at.elapsed() < self.failure_backoff)
            .map(|failure| JwksError::Shared(failure.error.clone()))
    }

    async fn fill(&self, state: &mut CacheState) -> Result<Arc<SigningKeySet>, JwksError> {
        match self.inner.fetch().await {
            Ok(jwks) => {
                state.entry = Some(CacheEntry {
                    jwks: jwks.clone(),
                    fetched_at: Instant::now(),
                });
                state.failure = None;
                Ok(jwks)
            }
            Err(err) => {
                warn!(error = %err, "signing key fetch failed");
                let err = Arc::new(err);
                state.failure = Some(FailedFetch {
                    error: err.clone(),
                    failed_at: Instant::now(),
                });
                Err(JwksError::Shared(err))
            }
        }
    }

    async fn bounded<T>(
        &self,
        op: impl std::future::Future<Output = Result<T, JwksError>>,
    ) -> Result<T, JwksError> {
        tokio::time::timeout(self.max_wait, op)
            .await
            .unwrap_or_else(|_| {
                warn!(waited = ?self.max_wait, "gave up waiting for signing keys");
                Err(JwksError::TimedOut {
                    waited: self.max_wait,
                })
            })
    }
}

#[async_trait]
impl<S: KeySource> KeySource for CachedKeySource<S> {
    async fn fetch(&self) -> Result<Arc<SigningKeySet>, JwksError> {
        self.bounded(async {
            // Held across the fetch so concurrent misses wait for one request.
            let mut state = self.state.lock().await;
            if let Some(entry) = &state.entry {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
            if let Some(err) = self.recent_failure(&state) {
                return Err(err);
            }
            self.fill(&mut state).await
        })
        .await
    }

    async fn refresh(&self) -> Result<Option<Arc<SigningKeySet>>, JwksError> {
        self.bounded(async {
            let mut state = self.state.lock().await;
            if let Some(entry) = &state.entry {
                if entry.fetched_at.elapsed() < self.min_refresh_interval {
                    debug!("signing keys refreshed recently, skipping refresh");
                    return Ok(None);
                }
            }
            if let Some(err) = self.recent_failure(&state) {
                return Err(err);
            }
            self.fill(&mut state).await.map(Some)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::{self, CountingKeySource, SlowFailingKeySource};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rsa_key(kid: &str, n: &str) -> SigningKey {
        SigningKey {
            kty: "RSA".to_string(),
            kid: Some(kid.to_string()),
            usage: Some("sig".to_string()),
            n: Some(n.to_string()),
            e: Some("AQAB".to_string()),
        }
    }

    #[test]
    fn find_returns_last_duplicate() {
        let set = SigningKeySet {
            keys: vec![rsa_key("a", "first"), rsa_key("b", "other"), rsa_key("a", "second")],
        };
        assert_eq!(set.find("a").and_then(|k| k.n.as_deref()), Some("second"));
        assert_eq!(set.find("b").and_then(|k| k.n.as_deref()), Some("other"));
        assert!(set.find("missing").is_none());
    }

    #[test]
    fn parses_provider_document_and_ignores_extra_fields() {
        let body = json!({
            "keys": [
                {
                    "kty": "RSA",
                    "use": "sig",
                    "n": test_support::SIGNING_KEY_N,
                    "e": "AQAB",
                    "kid": "f1C6JFEi32LrJ3CTGqS9L",
                    "x5t": "ignored",
                    "x5c": ["ignored"],
                    "alg": "RS256"
                },
                { "kty": "EC", "kid": "ec-key", "crv": "P-256", "x": "abc", "y": "def" }
            ]
        });
        let set: SigningKeySet = serde_json::from_value(body).unwrap();
        assert_eq!(set.keys.len(), 2);
        assert_eq!(set.keys[0].usage.as_deref(), Some("sig"));
        assert!(set.keys[0].decoding_key().is_some());
        assert!(set.keys[1].decoding_key().is_none());
    }

    #[tokio::test]
    async fn http_source_fetches_key_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keys": [test_support::signing_key()]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpKeySource::new(
            format!("{}/.well-known/jwks.json", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();
        let set = source.fetch().await.unwrap();
        assert_eq!(set.keys, vec![test_support::signing_key()]);
    }

    #[tokio::test]
    async fn http_source_reports_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpKeySource::new(
            format!("{}/.well-known/jwks.json", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, JwksError::Status { status, .. } if status.as_u16() == 503));
    }

    #[tokio::test]
    async fn http_source_reports_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let source = HttpKeySource::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, JwksError::Decode { .. }));
    }

    #[tokio::test]
    async fn http_source_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "keys": [] }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let source = HttpKeySource::new(server.uri(), Duration::from_millis(100)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err}");
    }

    #[tokio::test(start_paused = true)]
    async fn cache_serves_within_ttl_and_refetches_after() {
        let inner = CountingKeySource::new(test_support::key_set());
        let calls = inner.calls();
        let cached = CachedKeySource::new(inner).with_cache_ttl(Duration::from_secs(60));

        assert!(!cached.is_cached().await);
        cached.fetch().await.unwrap();
        cached.fetch().await.unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(cached.is_cached().await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!cached.is_cached().await);
        cached.fetch().await.unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_is_rate_limited() {
        let inner = CountingKeySource::new(test_support::key_set());
        let calls = inner.calls();
        let cached = CachedKeySource::new(inner)
            .with_cache_ttl(Duration::from_secs(300))
            .with_min_refresh_interval(Duration::from_secs(30));

        cached.fetch().await.unwrap();
        assert!(cached.refresh().await.unwrap().is_none());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(cached.refresh().await.unwrap().is_some());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn uncached_source_never_refreshes() {
        let inner = CountingKeySource::new(test_support::key_set());
        let calls = inner.calls();
        assert!(inner.refresh().await.unwrap().is_none());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let inner = CountingKeySource::new(test_support::key_set());
        let calls = inner.calls();
        let cached = Arc::new(CachedKeySource::new(inner));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cached = cached.clone();
                tokio::spawn(async move { cached.fetch().await.map(|set| set.keys.len()) })
            })
            .collect();
        let expected = test_support::key_set().keys.len();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), expected);
        }
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_callers_share_a_failed_fetch() {
        let inner = SlowFailingKeySource::new(Duration::from_secs(10));
        let calls = inner.calls();
        let cached = Arc::new(CachedKeySource::new(inner).with_max_wait(Duration::from_secs(15)));

        let started = Instant::now();
        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let cached = cached.clone();
                tokio::spawn(async move {
                    let failed = cached.fetch().await.is_err();
                    (failed, started.elapsed())
                })
            })
            .collect();
        for task in tasks {
            let (failed, waited) = task.await.unwrap();
            assert!(failed);
            assert!(waited <= Duration::from_secs(11), "waited {waited:?}");
        }
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_is_retried_after_backoff() {
        let inner = SlowFailingKeySource::new(Duration::ZERO);
        let calls = inner.calls();
        let cached = CachedKeySource::new(inner).with_failure_backoff(Duration::from_secs(5));

        assert!(cached.fetch().await.is_err());
        assert!(matches!(cached.refresh().await, Err(JwksError::Shared(_))));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cached.fetch().await.is_err());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_wait_is_bounded() {
        let cached = CachedKeySource::new(SlowFailingKeySource::new(Duration::from_secs(60)))
            .with_max_wait(Duration::from_secs(3));

        let started = Instant::now();
        let err = cached.fetch().await.unwrap_err();
        assert!(matches!(err, JwksError::TimedOut { .. }));
        assert!(err.is_timeout());
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(3) && waited < Duration::from_secs(4), "waited {waited:?}");
    }
}
