use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skybook_api::{app, AppState};
use skybook_booking::{ExpiryScheduler, LifecycleEngine};
use skybook_inventory::HttpFlightInventory;
use skybook_store::{DbClient, PostgresBookingStore, RedisIdempotencyGuard};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skybook_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = skybook_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Skybook API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let guard = RedisIdempotencyGuard::new(&config.redis.url)
        .expect("Failed to create Redis idempotency guard");

    let store = PostgresBookingStore::new(db.pool.clone());
    let inventory = HttpFlightInventory::new(config.flight_service.base_url.clone());

    let engine = Arc::new(LifecycleEngine::new(
        Arc::new(store),
        Arc::new(inventory),
        Arc::new(guard),
        chrono::Duration::seconds(config.business_rules.booking_expiry_seconds as i64),
    ));

    let scheduler = ExpiryScheduler::new(
        engine.clone(),
        Duration::from_secs(config.business_rules.sweep_interval_seconds),
    );
    tokio::spawn(scheduler.run());

    let app = app(AppState { engine });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
