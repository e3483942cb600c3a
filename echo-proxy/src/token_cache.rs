//! In-process catalog token cache
//!
//! One cached `{token, expires_at}` value behind a single accessor. The
//! expiry is the provider's `expires_in` minus [`EXPIRY_MARGIN_SECS`], measured
//! on the injected clock. Callers serialize on the cache lock, so at most
//! one refresh is in flight.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use echo_common::time::Clock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::services::spotify_auth::{AuthError, TokenSource};

/// Tokens are treated as expired this many seconds before the provider says so
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Upper bound on a provider-declared lifetime (one year)
const MAX_LIFETIME_SECS: u64 = 365 * 24 * 3600;

/// A token and the instant it stops being served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid token, refreshing from the source when needed
    pub async fn get_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_valid_at(self.clock.now()) {
                debug!("Using cached catalog token");
                return Ok(token.value.clone());
            }
        }

        info!("Requesting new catalog token");
        let issued = match self.source.fetch_token().await {
            Ok(issued) => issued,
            Err(e) => {
                error!("Catalog token request failed: {}", e);
                return Err(e);
            }
        };

        let lifetime = ChronoDuration::seconds(issued.expires_in.min(MAX_LIFETIME_SECS) as i64);
        let expires_at =
            self.clock.now() + lifetime - ChronoDuration::seconds(EXPIRY_MARGIN_SECS);
        info!(%expires_at, "Cached new catalog token");

        *cached = Some(CachedToken {
            value: issued.access_token.clone(),
            expires_at,
        });

        Ok(issued.access_token)
    }

    /// Current cache contents, without refreshing
    pub async fn peek(&self) -> Option<CachedToken> {
        self.cached.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::spotify_auth::IssuedToken;
    use async_trait::async_trait;
    use echo_common::time::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Issues "token-1", "token-2", ... valid for `expires_in` seconds
    struct CountingSource {
        calls: AtomicUsize,
        expires_in: u64,
        fail: bool,
    }

    impl CountingSource {
        fn new(expires_in: u64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                expires_in,
                fail: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch_token(&self) -> Result<IssuedToken, AuthError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(AuthError::ApiError(400, "invalid_client".to_string()));
            }
            Ok(IssuedToken {
                access_token: format!("token-{}", n),
                expires_in: self.expires_in,
            })
        }
    }

    fn cache_with(source: Arc<CountingSource>) -> (TokenCache, ManualClock) {
        let clock = ManualClock::at_epoch();
        (TokenCache::new(source, Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_token_reused_until_margin() {
        let source = Arc::new(CountingSource::new(3600));
        let (cache, clock) = cache_with(source.clone());

        assert_eq!(cache.get_token().await.unwrap(), "token-1");

        // 3600s lifetime minus 60s margin: still valid at 3539s
        clock.advance(Duration::from_secs(3539));
        assert_eq!(cache.get_token().await.unwrap(), "token-1");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_token_refreshed_at_margin() {
        let source = Arc::new(CountingSource::new(3600));
        let (cache, clock) = cache_with(source.clone());

        cache.get_token().await.unwrap();
        clock.advance(Duration::from_secs(3540));

        assert_eq!(cache.get_token().await.unwrap(), "token-2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_expiry_recorded_with_margin() {
        let source = Arc::new(CountingSource::new(100));
        let (cache, clock) = cache_with(source);

        cache.get_token().await.unwrap();

        let cached = cache.peek().await.unwrap();
        assert_eq!(cached.expires_at, clock.now() + ChronoDuration::seconds(40));
    }

    #[tokio::test]
    async fn test_short_lived_token_is_never_served_from_cache() {
        // Lifetime shorter than the margin: expired as soon as it is stored
        let source = Arc::new(CountingSource::new(30));
        let (cache, _clock) = cache_with(source.clone());

        cache.get_token().await.unwrap();
        cache.get_token().await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_returned_and_not_cached() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..CountingSource::new(3600)
        });
        let (cache, _clock) = cache_with(source.clone());

        assert!(cache.get_token().await.is_err());
        assert!(cache.peek().await.is_none());
        assert!(cache.get_token().await.is_err());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let source = Arc::new(CountingSource::new(3600));
        let (cache, _clock) = cache_with(source.clone());
        let cache = Arc::new(cache);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get_token().await.unwrap() }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), "token-1");
        }

        assert_eq!(source.calls(), 1);
    }
}
