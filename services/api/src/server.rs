use crate::cli::ServeArgs;
use crate::infra::{
    load_properties, AppState, InMemoryAccountRepository, InMemoryPropertyRepository,
    LocalSettingsStore,
};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rentease::config::AppConfig;
use rentease::error::AppError;
use rentease::marketplace::{AuthService, MarketplaceService, MarketplaceState, TokenAuthority};
use rentease::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let seeded = match &config.storage.seed_path {
        Some(path) => load_properties(path)?,
        None => Vec::new(),
    };
    let listing_count = seeded.len();
    let repository = Arc::new(InMemoryPropertyRepository::from_properties(seeded));
    let settings = Arc::new(LocalSettingsStore::open(config.storage.settings_path.clone())?);

    let accounts = Arc::new(InMemoryAccountRepository::default());
    match &config.auth.admin_password_hash {
        Some(hash) => accounts.seed_admin(&config.auth.admin_email, hash),
        None => warn!("RENTEASE_ADMIN_PASSWORD_HASH not set; admin routes are unreachable"),
    }
    let tokens = TokenAuthority::new(config.auth.jwt_secret.clone(), config.auth.token_ttl_hours);

    let state = MarketplaceState {
        marketplace: Arc::new(MarketplaceService::new(repository, settings)),
        auth: Arc::new(AuthService::new(accounts, tokens)),
    };

    let app = with_marketplace_routes(state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, listings = listing_count, "rental marketplace ready");

    axum::serve(listener, app).await?;
    Ok(())
}
