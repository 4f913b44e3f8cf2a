//! robots.txt compliance with a persistent policy cache.
//!
//! The engine resolves a URL to its origin's policy document, consulting the
//! store first and fetching over the network only on a miss or a stale
//! entry. Fetch outcomes map to verdicts as follows:
//!
//! - 2xx: cache the raw text, then parse and evaluate
//! - 401/403: disallow all for this origin (fail closed)
//! - other 4xx: allow all (no policy asserted)
//! - network failure, timeout, 5xx: the configured [`PolicyFailureMode`]
//!
//! Concurrent callers for one origin share a single policy fetch through an
//! origin-keyed lock; the lock holder re-checks the cache before fetching.

pub mod rules;

pub use cuppy_core::PolicyFailureMode;
pub use rules::{RequestRate, RuleSet};

use crate::fetch::{HttpFetcher, robots_location};
use cuppy_core::{AppConfig, Error, Store};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// Maximum size of a policy document to accept (1MB).
const MAX_POLICY_SIZE: usize = 1024 * 1024;

/// Evaluates crawl permissions against cached or freshly fetched policies.
pub struct ComplianceEngine {
    store: Store,
    fetcher: Arc<dyn HttpFetcher>,
    user_agent: String,
    failure_mode: PolicyFailureMode,
    /// None means cached policy documents never expire.
    ttl: Option<Duration>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ComplianceEngine {
    /// Create a new engine over the given store and network collaborator.
    pub fn new(store: Store, fetcher: Arc<dyn HttpFetcher>, config: &AppConfig) -> Self {
        Self {
            store,
            fetcher,
            user_agent: config.user_agent.clone(),
            failure_mode: config.policy_failure_mode,
            ttl: config.policy_ttl(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the configured user agent may fetch `url`.
    pub async fn can_fetch(&self, url: &Url) -> Result<bool, Error> {
        self.can_fetch_as(url, &self.user_agent).await
    }

    /// Whether `user_agent` may fetch `url`.
    pub async fn can_fetch_as(&self, url: &Url, user_agent: &str) -> Result<bool, Error> {
        let policy = self.policy_for(url).await?;
        Ok(policy.can_fetch(user_agent, url.path()))
    }

    /// Sitemap URLs declared by the policy for `url`'s origin.
    pub async fn sitemaps_for(&self, url: &Url) -> Result<Vec<String>, Error> {
        let policy = self.policy_for(url).await?;
        Ok(policy.sitemaps().to_vec())
    }

    /// Crawl-delay advisory for `url`'s origin, in seconds.
    pub async fn crawl_delay_for(&self, url: &Url, user_agent: &str) -> Result<Option<f64>, Error> {
        let policy = self.policy_for(url).await?;
        Ok(policy.crawl_delay(user_agent))
    }

    /// Request-rate advisory for `url`'s origin.
    pub async fn request_rate_for(&self, url: &Url, user_agent: &str) -> Result<Option<RequestRate>, Error> {
        let policy = self.policy_for(url).await?;
        Ok(policy.request_rate(user_agent))
    }

    /// The rule set governing `url`'s origin, from cache or the network.
    ///
    /// Only store failures surface as errors; every fetch outcome resolves
    /// locally into a rule set.
    pub async fn policy_for(&self, url: &Url) -> Result<Arc<RuleSet>, Error> {
        let location = robots_location(url);

        if let Some(policy) = self.cached_policy(&location).await? {
            return Ok(policy);
        }

        // Single-flight per origin: the first caller fetches, the rest wait
        // on the origin lock and then find the cache populated.
        let origin_lock = {
            let mut inflight = self.inflight.lock().await;
            inflight.entry(location.clone()).or_default().clone()
        };

        let result = async {
            let _guard = origin_lock.lock().await;
            if let Some(policy) = self.cached_policy(&location).await? {
                return Ok(policy);
            }
            let ruleset = self.fetch_policy(&location).await?;
            Ok(Arc::new(ruleset))
        }
        .await;

        // The last caller out drops the map entry; clones only happen under
        // the map lock, so the count cannot change underneath the check.
        let mut inflight = self.inflight.lock().await;
        if Arc::strong_count(&origin_lock) <= 2 {
            inflight.remove(&location);
        }

        result
    }

    /// Look up a cached policy document, honoring the TTL.
    async fn cached_policy(&self, location: &str) -> Result<Option<Arc<RuleSet>>, Error> {
        let Some(cached) = self.store.get_policy(location).await? else {
            return Ok(None);
        };

        if let Some(ttl) = self.ttl {
            let stale = match cached.age() {
                Some(age) => age.num_seconds() < 0 || age.num_seconds() as u64 > ttl.as_secs(),
                None => true,
            };
            if stale {
                tracing::debug!(location, "cached policy is stale, refetching");
                return Ok(None);
            }
        }

        tracing::debug!(location, "policy cache hit");
        Ok(Some(Arc::new(RuleSet::parse(&cached.content))))
    }

    /// Fetch the policy document and resolve the outcome into a rule set.
    /// The raw text is cached before evaluation, and only after the full
    /// body has been read.
    async fn fetch_policy(&self, location: &str) -> Result<RuleSet, Error> {
        let url = match Url::parse(location) {
            Ok(u) => u,
            Err(e) => return Ok(self.indeterminate(location, &e.to_string())),
        };

        let headers = vec![
            ("User-Agent".to_string(), self.user_agent.clone()),
            ("Accept".to_string(), "text/plain,*/*;q=0.8".to_string()),
        ];

        let response = match self.fetcher.get(&url, &headers).await {
            Ok(r) => r,
            Err(e) => return Ok(self.indeterminate(location, &e.to_string())),
        };

        match response.status {
            200..=299 => {
                if response.body.len() > MAX_POLICY_SIZE {
                    return Ok(self.indeterminate(location, "policy document too large"));
                }
                let content = String::from_utf8_lossy(&response.body).to_string();
                self.store.put_policy(location, &content).await?;
                Ok(RuleSet::parse(&content))
            }
            401 | 403 => {
                tracing::debug!(location, status = response.status, "auth error, disallowing origin");
                Ok(RuleSet::deny_all())
            }
            400..=499 => {
                tracing::debug!(location, status = response.status, "no policy asserted, allowing origin");
                Ok(RuleSet::permit_all())
            }
            status => Ok(self.indeterminate(location, &format!("status {}", status))),
        }
    }

    /// Resolve a "could not determine" outcome per the configured mode.
    fn indeterminate(&self, location: &str, reason: &str) -> RuleSet {
        tracing::warn!(location, reason, mode = ?self.failure_mode, "policy fetch failed");
        match self.failure_mode {
            PolicyFailureMode::Deny => RuleSet::deny_all(),
            PolicyFailureMode::Allow => RuleSet::permit_all(),
        }
    }
}
