use sdboard::datasource::{CacheServiceClient, SalesDoctorClient, TieredSource};
use sdboard::orchestration::Dashboard;
use sdboard::{api, cache::SnapshotCache, config::Config, SalesDoctorApi};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let direct: Arc<dyn SalesDoctorApi> = Arc::new(SalesDoctorClient::new(
        config.sd_api_url.clone(),
        config.sd_login.clone(),
        config.sd_password.clone(),
        config.upstream_timeout,
    ));

    // With a peer cache service configured, heavy entities go through it
    // first and fall back to the direct RPC client.
    let (source, peer) = match &config.cache_service_url {
        Some(url) => {
            let peer = Arc::new(CacheServiceClient::new(
                url.clone(),
                config.upstream_timeout,
            ));
            let tiered: Arc<dyn SalesDoctorApi> =
                Arc::new(TieredSource::new(peer.clone(), direct));
            (tiered, Some(peer))
        }
        None => (direct, None),
    };

    let cache = Arc::new(SnapshotCache::new(config.cache_ttl));
    let dashboard = Arc::new(Dashboard::new(
        source,
        peer,
        cache,
        config.exchange_rate,
        config.currency_policy.clone(),
        config.iroda_agents.clone(),
    ));

    // Create router
    let app = api::create_router(api::AppState::new(dashboard));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
