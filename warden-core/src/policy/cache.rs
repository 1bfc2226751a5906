//! Time-bounded cache in front of the remote policy source.
//!
//! Refresh is lazy and request-triggered: there is no background task, so the
//! cost is at most one extra remote call every TTL window per process. The
//! cached snapshot is process-local; instances may observe a policy change up
//! to one TTL apart, which is accepted staleness.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::policy::{PasswordPolicy, PolicyProvider};

struct CacheEntry {
    policy: PasswordPolicy,
    expires_at: DateTime<Utc>,
}

/// Wraps a [`PolicyProvider`] with a time-bounded cache.
///
/// On a fetch failure the previous entry and its expiry are left untouched:
/// a stale entry is never served past its own expiry, and a genuine miss
/// propagates "no policy known", which every dependent rule treats as
/// "policy disabled".
pub struct CachedPolicyProvider {
    source: Arc<dyn PolicyProvider>,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
}

impl CachedPolicyProvider {
    pub fn new(source: Arc<dyn PolicyProvider>) -> Self {
        Self::with_ttl(source, Duration::minutes(5))
    }

    pub fn with_ttl(source: Arc<dyn PolicyProvider>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Get the active policy, fetching from the source if the cache is cold
    /// or expired. Returns `None` when no policy is known.
    pub async fn get(&self) -> Option<PasswordPolicy> {
        {
            let entry = self.entry.lock().await;
            if let Some(cached) = entry.as_ref() {
                if Utc::now() < cached.expires_at {
                    return Some(cached.policy.clone());
                }
            }
        }

        match self.source.fetch_policy().await {
            Ok(Some(policy)) => {
                let mut entry = self.entry.lock().await;
                *entry = Some(CacheEntry {
                    policy: policy.clone(),
                    expires_at: Utc::now() + self.ttl,
                });
                Some(policy)
            }
            Ok(None) => {
                tracing::debug!("tenant has no password policy configured");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch password policy, treating as disabled");
                None
            }
        }
    }

    /// Drop the cached entry so the next `get` re-fetches.
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolicyError;
    use crate::{Error, PasswordPolicy};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Response {
        Policy,
        NoPolicy,
        Failure,
    }

    struct ScriptedProvider {
        responses: std::sync::Mutex<Vec<Response>>,
        fetches: AtomicUsize,
    }

    impl ScriptedProvider {
        /// Responses are consumed front to back; the last one repeats.
        fn new(responses: Vec<Response>) -> Self {
            Self {
                responses: std::sync::Mutex::new(responses),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PolicyProvider for ScriptedProvider {
        async fn fetch_policy(&self) -> Result<Option<PasswordPolicy>, Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            let response = if responses.len() > 1 {
                responses.remove(0)
            } else {
                match responses[0] {
                    Response::Policy => Response::Policy,
                    Response::NoPolicy => Response::NoPolicy,
                    Response::Failure => Response::Failure,
                }
            };
            match response {
                Response::Policy => Ok(Some(PasswordPolicy {
                    enable_password_policy: true,
                    min_password_length: 8,
                    ..PasswordPolicy::default()
                })),
                Response::NoPolicy => Ok(None),
                Response::Failure => {
                    Err(PolicyError::Unavailable("connection refused".to_string()).into())
                }
            }
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_refetch() {
        let provider = Arc::new(ScriptedProvider::new(vec![Response::Policy]));
        let cache = CachedPolicyProvider::new(provider.clone());

        let first = cache.get().await;
        let second = cache.get().await;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let provider = Arc::new(ScriptedProvider::new(vec![Response::Policy]));
        let cache = CachedPolicyProvider::with_ttl(provider.clone(), Duration::zero());

        cache.get().await;
        cache.get().await;

        assert_eq!(provider.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_none() {
        let provider = Arc::new(ScriptedProvider::new(vec![Response::Failure]));
        let cache = CachedPolicyProvider::new(provider.clone());

        assert!(cache.get().await.is_none());
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_not_served_after_expiry_on_failure() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Response::Policy,
            Response::Failure,
        ]));
        let cache = CachedPolicyProvider::with_ttl(provider.clone(), Duration::zero());

        assert!(cache.get().await.is_some());
        // The entry expired immediately, and the refetch fails: a genuine
        // miss must propagate rather than reviving the stale entry.
        assert!(cache.get().await.is_none());
        assert_eq!(provider.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_no_policy_is_not_cached() {
        let provider = Arc::new(ScriptedProvider::new(vec![Response::NoPolicy]));
        let cache = CachedPolicyProvider::new(provider.clone());

        assert!(cache.get().await.is_none());
        assert!(cache.get().await.is_none());
        assert_eq!(provider.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let provider = Arc::new(ScriptedProvider::new(vec![Response::Policy]));
        let cache = CachedPolicyProvider::new(provider.clone());

        cache.get().await;
        cache.invalidate().await;
        cache.get().await;

        assert_eq!(provider.fetch_count(), 2);
    }
}
