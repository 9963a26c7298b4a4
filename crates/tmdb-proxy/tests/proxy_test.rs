use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use gavetta_cache::ManualClock;
use http_body_util::BodyExt;
use mock_tmdb::MockTmdb;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tmdb_proxy::{admin_router, router, AppState, Config, TmdbClient};
use tower::ServiceExt;

struct Harness {
    mock: MockTmdb,
    state: Arc<AppState>,
    app: Router,
    clock: Arc<ManualClock>,
}

async fn harness_with(token: &str, configure: impl FnOnce(&mut Config)) -> Harness {
    let mock = MockTmdb::new();
    let addr = mock.spawn().await.expect("mock tmdb binds");

    let mut config = Config::default_config();
    config.upstream.url = format!("http://{addr}");
    configure(&mut config);

    let client = TmdbClient::new(&config.upstream.url, token, config.upstream_timeout()).unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let state = Arc::new(AppState::from_config(
        &config,
        Arc::new(client),
        clock.clone(),
    ));

    Harness {
        mock,
        app: router(Arc::clone(&state)),
        state,
        clock,
    }
}

async fn harness() -> Harness {
    harness_with("test-token", |_| {}).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn x_cache(headers: &HeaderMap) -> &str {
    headers
        .get("x-cache")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn movie_details_miss_then_hit() {
    let h = harness().await;
    let uri = "/?action=getMovieDetails&movieId=603";

    let (status, headers, first) = get(&h.app, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(x_cache(&headers), "MISS");
    assert_eq!(first["id"], 603);
    assert_eq!(first["runtime"], 136);
    assert_eq!(h.mock.request_count(), 1);

    let (status, headers, second) = get(&h.app, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(x_cache(&headers), "HIT");
    assert_eq!(first, second);
    assert_eq!(h.mock.request_count(), 1);
}

#[tokio::test]
async fn parameter_order_does_not_matter() {
    let h = harness().await;

    let (_, headers, _) = get(&h.app, "/?action=discoverMovies&genreId=878&page=1").await;
    assert_eq!(x_cache(&headers), "MISS");

    let (_, headers, body) = get(&h.app, "/tmdb?page=1&genreId=878&action=discoverMovies").await;
    assert_eq!(x_cache(&headers), "HIT");
    assert_eq!(body[0]["id"], 603);
    assert_eq!(h.mock.request_count(), 1);
}

#[tokio::test]
async fn details_expire_after_an_hour() {
    let h = harness().await;
    let uri = "/?action=getMovieDetails&movieId=603";

    get(&h.app, uri).await;
    h.clock.advance(Duration::from_secs(3600) - Duration::from_millis(1));
    let (_, headers, _) = get(&h.app, uri).await;
    assert_eq!(x_cache(&headers), "HIT");

    h.clock.advance(Duration::from_millis(2));
    let (_, headers, _) = get(&h.app, uri).await;
    assert_eq!(x_cache(&headers), "MISS");
    assert_eq!(h.mock.request_count(), 2);
}

#[tokio::test]
async fn blank_search_short_circuits() {
    let h = harness().await;

    for uri in [
        "/?action=searchMovies&query=",
        "/?action=searchTVShows&query=%20%20",
        "/?action=searchPerson",
    ] {
        let (status, headers, body) = get(&h.app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!([]));
        assert_eq!(x_cache(&headers), "BYPASS");
    }

    assert_eq!(h.mock.request_count(), 0);
    assert!(h.state.dispatcher.store().is_empty());
}

#[tokio::test]
async fn search_results_are_unwrapped() {
    let h = harness().await;
    let (status, _, body) = get(&h.app, "/?action=searchMovies&query=matrix").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Matrix");
}

#[tokio::test]
async fn client_errors_are_400_and_skip_upstream() {
    let h = harness().await;

    let (status, _, body) = get(&h.app, "/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Action is required"}));

    let (status, _, body) = get(&h.app, "/?action=getTrending").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid action"}));

    let (status, _, body) = get(&h.app, "/?action=getTVDetails").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "missing or invalid parameter: tvId"}));

    assert_eq!(h.mock.request_count(), 0);
}

#[tokio::test]
async fn upstream_status_is_propagated_and_not_cached() {
    let h = harness().await;
    let uri = "/?action=getMovieDetails&movieId=1";

    let (status, headers, body) = get(&h.app, uri).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"error": "TMDB API error: 404"}));
    assert!(headers.get("x-cache").is_none());

    get(&h.app, uri).await;
    assert_eq!(h.mock.request_count(), 2);
    assert!(h.state.dispatcher.store().is_empty());
}

#[tokio::test]
async fn missing_token_surfaces_as_401_from_upstream() {
    let h = harness_with("", |_| {}).await;
    let (status, _, body) = get(&h.app, "/?action=getTVDetails&tvId=1396").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"error": "TMDB API error: 401"}));
}

#[tokio::test]
async fn unreachable_upstream_is_a_transport_error() {
    // Bind and release a port so nothing is listening on it
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let h = harness_with("test-token", |config| {
        config.upstream.url = format!("http://{closed}");
    })
    .await;

    let (status, headers, body) = get(&h.app, "/?action=getMovieDetails&movieId=603").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(headers.get("x-cache").is_none());
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("TMDB request failed"), "{message}");
    assert!(h.state.dispatcher.store().is_empty());
    assert_eq!(h.mock.request_count(), 0);
}

#[tokio::test]
async fn person_credits_are_merged() {
    let h = harness().await;
    let (status, _, body) = get(&h.app, "/?action=getPersonCredits&personId=6384").await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_u64().unwrap())
        .collect();
    // Newest first; Man of Tai Chi once; the produced title is gone; undated last
    assert_eq!(ids, vec![61860, 245891, 138832, 603, 99999]);
    assert_eq!(body[2]["character"], "Donaka Mark");
    assert_eq!(body[0]["media_type"], "tv");
}

#[tokio::test]
async fn watch_providers_pick_brazil_or_null() {
    let h = harness().await;

    let (_, _, body) = get(&h.app, "/?action=getMovieWatchProviders&movieId=603").await;
    assert_eq!(
        body["link"],
        "https://www.themoviedb.org/movie/603/watch?locale=BR"
    );
    assert_eq!(body["rent"][0]["provider_name"], "Apple TV");

    let (status, headers, body) = get(&h.app, "/?action=getTVWatchProviders&tvId=1396").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
    assert_eq!(x_cache(&headers), "MISS");

    // null is cached like any other payload
    let (_, headers, _) = get(&h.app, "/?action=getTVWatchProviders&tvId=1396").await;
    assert_eq!(x_cache(&headers), "HIT");
}

#[tokio::test]
async fn person_search_keeps_five_summaries() {
    let h = harness().await;
    let (_, _, body) = get(&h.app, "/?action=searchPerson&query=keanu").await;
    let people = body.as_array().unwrap();
    assert_eq!(people.len(), 5);
    assert_eq!(
        people[0],
        json!({
            "id": 6384,
            "name": "Keanu Reeves",
            "profile_path": "/4D0PpNI0kmP58hgrwGC3wCjxhnm.jpg"
        })
    );
}

#[tokio::test]
async fn credits_and_episodes_shapes() {
    let h = harness().await;

    let (_, _, body) = get(&h.app, "/?action=getMovieCredits&movieId=603").await;
    assert_eq!(body.as_object().unwrap().len(), 2);
    assert_eq!(body["cast"][0]["character"], "Neo");
    assert_eq!(body["crew"].as_array().unwrap().len(), 2);

    let (_, _, body) = get(&h.app, "/?action=getTVCredits&tvId=1396").await;
    assert_eq!(body["cast"][0]["name"], "Bryan Cranston");

    let (_, _, body) = get(&h.app, "/?action=getSeasonEpisodes&tvId=1396&seasonNumber=1").await;
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0]["episode_number"], 1);

    let (_, _, body) = get(&h.app, "/?action=getPersonDetails&personId=6384").await;
    assert_eq!(body["birthday"], "1964-09-02");

    let (_, _, body) = get(&h.app, "/?action=discoverTVShows").await;
    assert_eq!(body[0]["name"], "Breaking Bad");
}

#[tokio::test]
async fn store_evicts_oldest_batch_when_full() {
    let h = harness_with("test-token", |config| {
        config.cache.max_entries = 3;
        config.cache.evict_batch = 2;
    })
    .await;

    for page in 1..=3 {
        get(&h.app, &format!("/?action=discoverMovies&page={page}")).await;
        h.clock.advance(Duration::from_millis(10));
    }
    assert_eq!(h.state.dispatcher.store().len(), 3);

    get(&h.app, "/?action=discoverMovies&page=4").await;
    assert_eq!(h.state.dispatcher.store().len(), 2);

    // Pages 1 and 2 were the oldest
    let (_, headers, _) = get(&h.app, "/?action=discoverMovies&page=3").await;
    assert_eq!(x_cache(&headers), "HIT");
    let (_, headers, _) = get(&h.app, "/?action=discoverMovies&page=1").await;
    assert_eq!(x_cache(&headers), "MISS");
    assert_eq!(h.state.dispatcher.stats().evictions, 2);
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let h = harness().await;
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/?action=getMovieDetails&movieId=603")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "GET")
        .header("access-control-request-headers", "apikey")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(h.mock.request_count(), 0);
}

#[tokio::test]
async fn stats_endpoint_reports_store() {
    let h = harness().await;
    get(&h.app, "/?action=getMovieDetails&movieId=603").await;
    get(&h.app, "/?action=getMovieDetails&movieId=603").await;

    let admin = admin_router::<fn() -> String>(Arc::clone(&h.state), None);
    let (status, _, body) = get(&admin, "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"]["hits"], 1);
    assert_eq!(body["cache"]["misses"], 1);
    assert_eq!(body["cache"]["size"], 1);
    assert_eq!(body["cache"]["capacity"], 500);
    assert_eq!(body["cache"]["evict_batch"], 100);
    assert_eq!(body["ttl_secs"]["details"], 3600);
    assert_eq!(body["ttl_secs"]["search"], 300);
    assert_eq!(body["coalesce_misses"], false);
}

#[tokio::test]
async fn metrics_route_uses_renderer() {
    let h = harness().await;
    let admin = admin_router(Arc::clone(&h.state), Some(|| "tmdb_up 1\n".to_string()));

    let resp = admin
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"tmdb_up 1\n");
}
