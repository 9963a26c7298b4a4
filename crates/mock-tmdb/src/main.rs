use mock_tmdb::MockTmdb;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Simulate upstream latency (5-20ms)
    let app = MockTmdb::new().with_latency(5, 20).router();

    let addr = "0.0.0.0:3000";
    tracing::info!(addr, "mock tmdb starting");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
