use crate::action::{Action, TtlPolicy};
use crate::coalesce::{MissCoalescer, Slot};
use crate::error::ProxyError;
use crate::metrics;
use crate::payload::{self, Payload};
use crate::request::{self, Locale, Params, Plan};
use crate::upstream::{Endpoint, Upstream, UpstreamError};
use arc_swap::ArcSwap;
use gavetta_cache::{CacheKey, CacheStats, ResponseStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a successful response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Answered without touching the cache (blank search query).
    Bypass,
}

impl CacheStatus {
    /// Value of the `X-Cache` response header.
    pub fn header_value(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Bypass => "bypass",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dispatched {
    pub action: Action,
    pub payload: Arc<Payload>,
    pub cache: CacheStatus,
}

/// Maps `(action, params)` to a payload, through the response store.
pub struct Dispatcher {
    store: ResponseStore<Payload>,
    upstream: Arc<dyn Upstream>,
    ttl: ArcSwap<TtlPolicy>,
    locale: Locale,
    coalescer: Option<MissCoalescer>,
}

impl Dispatcher {
    pub fn new(
        store: ResponseStore<Payload>,
        upstream: Arc<dyn Upstream>,
        ttl: TtlPolicy,
        locale: Locale,
        coalesce_misses: bool,
    ) -> Self {
        tracing::info!(
            max_entries = store.config().max_entries,
            evict_batch = store.config().evict_batch,
            coalesce_misses,
            "dispatcher initialized"
        );

        Self {
            store,
            upstream,
            ttl: ArcSwap::from_pointee(ttl),
            locale,
            coalescer: coalesce_misses.then(MissCoalescer::new),
        }
    }

    /// Handle one request. `params` is the full inbound parameter set; all of
    /// it goes into the cache key.
    pub async fn dispatch(
        &self,
        action_name: &str,
        params: &Params,
    ) -> Result<Dispatched, ProxyError> {
        let action = Action::from_name(action_name)
            .ok_or_else(|| ProxyError::InvalidAction(action_name.to_string()))?;

        let endpoint = match request::plan(action, params, &self.locale)? {
            Plan::Empty => {
                metrics::record_lookup(action, CacheStatus::Bypass);
                return Ok(Dispatched {
                    action,
                    payload: Arc::new(Payload::empty_list()),
                    cache: CacheStatus::Bypass,
                });
            }
            Plan::Fetch(endpoint) => endpoint,
        };

        let key = CacheKey::derive(action.name(), params.iter());
        let ttl = self.ttl.load().ttl(action.class());

        if let Some(payload) = self.store.get(&key, ttl) {
            return Ok(self.hit(action, &key, payload));
        }

        self.miss(action, key, ttl, &endpoint).await
    }

    /// Fetch, normalize and store after a missed lookup.
    async fn miss(
        &self,
        action: Action,
        key: CacheKey,
        ttl: Duration,
        endpoint: &Endpoint,
    ) -> Result<Dispatched, ProxyError> {
        // Held until the payload is stored, so followers find it
        let _leader = match &self.coalescer {
            Some(coalescer) => {
                let slot = coalescer.acquire(key.as_str()).await;
                // A previous leader may have stored the key since the first lookup
                if let Some(payload) = self.store.get(&key, ttl) {
                    return Ok(self.hit(action, &key, payload));
                }
                match slot {
                    Slot::Leader(guard) => Some(guard),
                    Slot::Follower => None,
                }
            }
            None => None,
        };

        let payload = Arc::new(self.fetch(action, endpoint).await?);
        self.store.set(key.clone(), Arc::clone(&payload));

        tracing::debug!(action = action.name(), key = %key, "cache MISS → upstream");
        metrics::record_lookup(action, CacheStatus::Miss);

        Ok(Dispatched {
            action,
            payload,
            cache: CacheStatus::Miss,
        })
    }

    fn hit(&self, action: Action, key: &CacheKey, payload: Arc<Payload>) -> Dispatched {
        tracing::debug!(action = action.name(), key = %key, "cache HIT");
        metrics::record_lookup(action, CacheStatus::Hit);
        Dispatched {
            action,
            payload,
            cache: CacheStatus::Hit,
        }
    }

    async fn fetch(&self, action: Action, endpoint: &Endpoint) -> Result<Payload, UpstreamError> {
        let start = Instant::now();
        let result = self.upstream.fetch(endpoint).await;
        metrics::record_upstream_latency(action, start.elapsed());

        let normalized = result.and_then(|body| payload::normalize(action, body, &self.locale));
        if let Err(e) = &normalized {
            tracing::warn!(
                action = action.name(),
                path = %endpoint.path,
                status = ?e.status(),
                error = %e,
                "upstream request failed"
            );
            metrics::record_upstream_error(action);
        }
        normalized
    }

    pub fn ttl_policy(&self) -> Arc<TtlPolicy> {
        self.ttl.load_full()
    }

    /// Swap the TTL table. Cached entries stay; the new windows apply from the
    /// next read.
    pub fn set_ttl_policy(&self, policy: TtlPolicy) {
        self.ttl.store(Arc::new(policy));
    }

    pub fn coalescing(&self) -> bool {
        self.coalescer.is_some()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    pub fn store(&self) -> &ResponseStore<Payload> {
        &self.store
    }
}
