use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::ProxyError;
use crate::metrics::stats_handler;
use crate::request::Params;
use crate::upstream::Upstream;
use axum::extract::{Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use gavetta_cache::{Clock, ResponseStore};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Shared application state passed to all handlers.
pub struct AppState {
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn from_config(
        config: &Config,
        upstream: Arc<dyn Upstream>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = ResponseStore::with_clock(config.store_config(), clock);
        Self::new(Dispatcher::new(
            store,
            upstream,
            config.cache.ttl.to_policy(),
            config.locale(),
            config.cache.coalesce_misses,
        ))
    }
}

/// Main handler: `GET /?action=...&...`.
pub async fn tmdb_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let start = Instant::now();
    let params = Params::from(pairs);

    let Some(action) = params.get("action").filter(|a| !a.is_empty()) else {
        return ProxyError::MissingAction.into_response();
    };

    match state.dispatcher.dispatch(action, &params).await {
        Ok(dispatched) => {
            tracing::debug!(
                action = dispatched.action.name(),
                cache = dispatched.cache.header_value(),
                latency_us = start.elapsed().as_micros(),
                "request served"
            );

            let mut response = Json(dispatched.payload.as_ref()).into_response();
            response.headers_mut().insert(
                X_CACHE,
                HeaderValue::from_static(dispatched.cache.header_value()),
            );
            response
        }
        Err(e) => {
            if e.is_client_error() {
                tracing::debug!(action, error = %e, "request rejected");
            } else {
                tracing::error!(action, error = %e, "TMDB proxy error");
            }
            e.into_response()
        }
    }
}

/// CORS for browser callers of the proxy.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
        .expose_headers([X_CACHE])
}

/// Public router. The handler is mounted at `/` and `/tmdb`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(tmdb_handler))
        .route("/tmdb", get(tmdb_handler))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Admin router (separate port): JSON stats plus the Prometheus scrape
/// endpoint when a renderer is supplied.
pub fn admin_router<F>(state: Arc<AppState>, render_metrics: Option<F>) -> Router
where
    F: Fn() -> String + Clone + Send + Sync + 'static,
{
    let router = Router::new().route("/api/stats", get(stats_handler));

    let router = match render_metrics {
        Some(render) => router.route(
            "/metrics",
            get(move || {
                let render = render.clone();
                async move { render() }
            }),
        ),
        None => router,
    };

    router.with_state(state)
}
