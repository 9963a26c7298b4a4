use crate::action::{Action, ActionClass};
use crate::dispatch::CacheStatus;
use crate::proxy::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use gavetta_cache::CacheStats;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub fn record_lookup(action: Action, status: CacheStatus) {
    ::metrics::counter!(
        "tmdb_cache_requests_total",
        "action" => action.name(),
        "result" => status.label()
    )
    .increment(1);
}

pub fn record_upstream_error(action: Action) {
    ::metrics::counter!("tmdb_upstream_errors_total", "action" => action.name()).increment(1);
}

pub fn record_upstream_latency(action: Action, elapsed: Duration) {
    ::metrics::histogram!("tmdb_upstream_latency_seconds", "action" => action.name())
        .record(elapsed.as_secs_f64());
}

/// Response body of `GET /api/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub cache: StoreMetrics,
    /// TTL per action class, in seconds.
    pub ttl_secs: BTreeMap<&'static str, u64>,
    pub coalesce_misses: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreMetrics {
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
    pub evict_batch: usize,
}

impl StoreMetrics {
    fn from_stats(stats: &CacheStats, evict_batch: usize) -> Self {
        StoreMetrics {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            evictions: stats.evictions,
            size: stats.current_size,
            capacity: stats.capacity,
            evict_batch,
        }
    }
}

impl StatsSnapshot {
    pub fn capture(state: &AppState) -> Self {
        let dispatcher = &state.dispatcher;
        let policy = dispatcher.ttl_policy();

        StatsSnapshot {
            cache: StoreMetrics::from_stats(
                &dispatcher.stats(),
                dispatcher.store().config().evict_batch,
            ),
            ttl_secs: ActionClass::ALL
                .iter()
                .map(|class| (class.name(), policy.ttl(*class).as_secs()))
                .collect(),
            coalesce_misses: dispatcher.coalescing(),
        }
    }
}

/// GET /api/stats: one-shot stats endpoint.
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatsSnapshot::capture(&state))
}
