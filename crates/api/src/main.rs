use std::net::SocketAddr;
use std::sync::Arc;

use floors_core::{Conversions, RateTable};
use floors_fetcher::{FetcherConfig, LogMetrics, MemoryCache, PriceFloorFetcher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use floors_api::config::{load_rates, AccountRegistry, ServerConfig};
use floors_api::router::build_app_router;
use floors_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "floors_api=debug,floors_fetcher=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let accounts = match &config.accounts_file {
        Some(path) => AccountRegistry::load(path).expect("Failed to load accounts file"),
        None => AccountRegistry::open(),
    };
    tracing::info!(
        accounts = accounts.accounts.len(),
        has_default = accounts.default.is_some(),
        "Loaded account floor settings",
    );

    let rates = match &config.rates_file {
        Some(path) => load_rates(path).expect("Failed to load rates file"),
        None => RateTable::new(),
    };
    let conversions: Arc<dyn Conversions> = Arc::new(rates);

    // --- Fetch scheduler ---
    let fetcher_config = FetcherConfig::from_env();
    let fetcher = PriceFloorFetcher::start(
        fetcher_config,
        Arc::new(MemoryCache::new()),
        Arc::new(LogMetrics),
    );

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        accounts: Arc::new(accounts),
        conversions,
        fetcher: Arc::clone(&fetcher),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    fetcher.stop();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
