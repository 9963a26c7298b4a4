//! Local stand-in for the TMDB v3 API.
//!
//! Serves the endpoints the proxy calls from fixture data, requires a bearer
//! token like the real API, and counts requests so tests can assert how often
//! the upstream was hit.

pub mod fixtures;

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Handle to a mock TMDB. Clones share the request counter.
#[derive(Clone, Default)]
pub struct MockTmdb {
    requests: Arc<AtomicU64>,
    /// Inclusive latency range in milliseconds.
    latency_ms: Option<(u64, u64)>,
}

impl MockTmdb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate upstream latency, picked uniformly per request.
    pub fn with_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency_ms = Some((min_ms, max_ms.max(min_ms)));
        self
    }

    /// Requests received so far, including rejected ones.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/search/movie", get(search_movie))
            .route("/search/tv", get(search_tv))
            .route("/search/person", get(search_person))
            .route("/movie/{id}", get(movie_details))
            .route("/movie/{id}/credits", get(movie_credits))
            .route("/movie/{id}/watch/providers", get(watch_providers))
            .route("/tv/{id}", get(tv_details))
            .route("/tv/{id}/credits", get(tv_credits))
            .route("/tv/{id}/season/{season}", get(season))
            .route("/tv/{id}/watch/providers", get(watch_providers))
            .route("/person/{id}", get(person_details))
            .route("/person/{id}/combined_credits", get(person_credits))
            .route("/discover/movie", get(discover_movie))
            .route("/discover/tv", get(discover_tv))
            .route("/health", get(health))
            .layer(middleware::from_fn_with_state(self.clone(), count_and_authorize))
            .with_state(self.clone())
    }

    /// Bind an ephemeral port on localhost and serve in the background.
    pub async fn spawn(&self) -> std::io::Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "mock tmdb server error");
            }
        });
        Ok(addr)
    }
}

/// Count every request, apply simulated latency, reject missing bearer tokens.
async fn count_and_authorize(State(mock): State<MockTmdb>, req: Request, next: Next) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);

    if let Some((min, max)) = mock.latency_ms {
        let delay = rand::thread_rng().gen_range(min..=max);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if req.uri().path() == "/health" {
        return next.run(req).await;
    }

    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| !token.trim().is_empty());

    if !authorized {
        return tmdb_error(
            StatusCode::UNAUTHORIZED,
            7,
            "Invalid API key: You must be granted a valid key.",
        );
    }

    next.run(req).await
}

/// TMDB-style error body.
fn tmdb_error(status: StatusCode, code: u32, message: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "status_code": code,
            "status_message": message
        })),
    )
        .into_response()
}

fn not_found() -> Response {
    tmdb_error(
        StatusCode::NOT_FOUND,
        34,
        "The resource you requested could not be found.",
    )
}

fn found(body: Option<Value>) -> Response {
    match body {
        Some(body) => Json(body).into_response(),
        None => not_found(),
    }
}

fn page(results: Vec<Value>, page: u32) -> Json<Value> {
    let total = results.len();
    Json(json!({
        "page": page,
        "results": results,
        "total_pages": 1,
        "total_results": total
    }))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Deserialize)]
struct DiscoverQuery {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    with_genres: Option<String>,
}

fn matching(items: Vec<Value>, field: &str, query: &str) -> Vec<Value> {
    let query = query.trim().to_lowercase();
    items
        .into_iter()
        .filter(|item| {
            item.get(field)
                .and_then(Value::as_str)
                .is_some_and(|v| v.to_lowercase().contains(&query))
        })
        .collect()
}

fn with_genres(items: Vec<Value>, genres: Option<&str>) -> Vec<Value> {
    let Some(genres) = genres.filter(|g| !g.is_empty()) else {
        return items;
    };
    let wanted: Vec<u64> = genres
        .split([',', '|'])
        .filter_map(|g| g.trim().parse().ok())
        .collect();
    let has_wanted = |id: &Value| id.as_u64().is_some_and(|id| wanted.contains(&id));
    items
        .into_iter()
        .filter(|item| {
            item.get("genre_ids")
                .and_then(Value::as_array)
                .is_some_and(|ids| ids.iter().any(has_wanted))
        })
        .collect()
}

async fn search_movie(Query(q): Query<SearchQuery>) -> Json<Value> {
    page(matching(fixtures::movies(), "title", &q.query), 1)
}

async fn search_tv(Query(q): Query<SearchQuery>) -> Json<Value> {
    page(matching(fixtures::tv_shows(), "name", &q.query), 1)
}

async fn search_person(Query(q): Query<SearchQuery>) -> Json<Value> {
    page(matching(fixtures::people(), "name", &q.query), 1)
}

async fn movie_details(Path(id): Path<u64>) -> Response {
    found(fixtures::movie_details(id))
}

async fn movie_credits(Path(id): Path<u64>) -> Response {
    found(fixtures::movie_credits(id))
}

async fn watch_providers(Path(id): Path<u64>) -> Json<Value> {
    Json(fixtures::watch_providers(id))
}

async fn tv_details(Path(id): Path<u64>) -> Response {
    found(fixtures::tv_details(id))
}

async fn tv_credits(Path(id): Path<u64>) -> Response {
    found(fixtures::tv_credits(id))
}

async fn season(Path((id, season)): Path<(u64, u32)>) -> Response {
    found(fixtures::season(id, season))
}

async fn person_details(Path(id): Path<u64>) -> Response {
    found(fixtures::person_details(id))
}

async fn person_credits(Path(id): Path<u64>) -> Response {
    found(fixtures::person_combined_credits(id))
}

async fn discover_movie(Query(q): Query<DiscoverQuery>) -> Json<Value> {
    page(
        with_genres(fixtures::movies(), q.with_genres.as_deref()),
        q.page.unwrap_or(1),
    )
}

async fn discover_tv(Query(q): Query<DiscoverQuery>) -> Json<Value> {
    page(
        with_genres(fixtures::tv_shows(), q.with_genres.as_deref()),
        q.page.unwrap_or(1),
    )
}

async fn health() -> &'static str {
    "ok"
}
