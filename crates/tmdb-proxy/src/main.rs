use clap::Parser;
use gavetta_cache::SystemClock;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tmdb_proxy::config::{self, Config};
use tmdb_proxy::{admin_router, router, AppState, TmdbClient};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Caching proxy for the TMDB metadata API.
#[derive(Parser)]
#[command(name = "tmdb-proxy")]
struct Args {
    /// Path to the TOML config file (watched for TTL changes)
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load config
    let config = if args.config.exists() {
        match Config::load(&args.config) {
            Ok(c) => {
                tracing::info!(path = %args.config.display(), "loaded config");
                c
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %args.config.display(),
                    "failed to load config, using defaults"
                );
                Config::default_config()
            }
        }
    } else {
        tracing::info!(path = %args.config.display(), "no config file found, using defaults");
        Config::default_config()
    };

    let token = config.resolve_token().unwrap_or_else(|| {
        tracing::warn!(
            env = config::TOKEN_ENV,
            "no TMDB token configured, upstream calls will be rejected"
        );
        String::new()
    });

    // Install Prometheus metrics recorder
    let prom_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("prometheus recorder");

    let client = TmdbClient::new(&config.upstream.url, &token, config.upstream_timeout())
        .unwrap_or_else(|e| panic!("failed to build TMDB client: {e}"));

    let state = Arc::new(AppState::from_config(
        &config,
        Arc::new(client),
        Arc::new(SystemClock),
    ));

    // Shutdown token for graceful shutdown
    let shutdown = CancellationToken::new();

    let proxy_router = router(Arc::clone(&state));
    let admin = admin_router(
        Arc::clone(&state),
        Some(move || prom_handle.render()),
    );

    let proxy_addr = config.server.listen_addr.clone();
    let metrics_addr = config.server.metrics_addr.clone();

    tracing::info!(
        proxy = %proxy_addr,
        metrics = %metrics_addr,
        upstream = %config.upstream.url,
        max_entries = config.cache.max_entries,
        evict_batch = config.cache.evict_batch,
        coalesce_misses = config.cache.coalesce_misses,
        "tmdb proxy starting"
    );

    let proxy_listener = tokio::net::TcpListener::bind(&proxy_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind proxy to {proxy_addr}: {e}"));

    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind metrics to {metrics_addr}: {e}"));

    // Spawn config file watcher
    spawn_config_watcher(args.config, config, Arc::clone(&state));

    // Spawn shutdown signal handler
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal(shutdown_clone).await;
    });

    let proxy_future = axum::serve(proxy_listener, proxy_router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned());

    let metrics_future = axum::serve(metrics_listener, admin)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned());

    tokio::select! {
        result = proxy_future => {
            if let Err(e) = result {
                tracing::error!(error = %e, "proxy server error");
            }
        }
        result = metrics_future => {
            if let Err(e) = result {
                tracing::error!(error = %e, "metrics server error");
            }
        }
    }

    tracing::info!("tmdb proxy shut down");
}

/// Listen for SIGINT (Ctrl+C) or SIGTERM and cancel the shutdown token.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }

    tracing::info!("shutdown signal received, draining connections...");
    token.cancel();
}

/// Watch the config file and apply TTL changes at runtime.
fn spawn_config_watcher(config_path: PathBuf, initial_config: Config, state: Arc<AppState>) {
    let current_config = Arc::new(Mutex::new(initial_config));

    let config_path_clone = config_path.clone();
    let mut watcher = match notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                match Config::load(&config_path_clone) {
                    Ok(new_config) => {
                        let mut old = current_config.lock();
                        config::diff_and_apply(&old, &new_config, &state.dispatcher);
                        *old = new_config;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to reload config");
                    }
                }
            }
        }
    }) {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(error = %e, "failed to start config watcher");
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_path, RecursiveMode::NonRecursive) {
        tracing::warn!(error = %e, path = %config_path.display(), "failed to watch config file");
        return;
    }

    // Leak the watcher so it lives for the process lifetime
    std::mem::forget(watcher);
    tracing::info!(path = %config_path.display(), "config file watcher started");
}
