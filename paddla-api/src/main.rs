use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use paddla_api::{app, auth::seed_admin, state::{AppState, AuthConfig}};
use paddla_booking::{BookingAdmin, ReservationManager};
use paddla_core::payment::{PaymentProvider, SimulatedPaymentProvider};
use paddla_core::{AdminUserRepository, BookingStore, SessionStore};
use paddla_store::{app_config::Config, DbClient, PgBookingStore, PgUserStore, RedisSessionStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paddla_api=debug,paddla_booking=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Paddla API on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    // Redis
    let sessions = RedisSessionStore::new(&config.redis.url, config.session.ttl_seconds)
        .context("Invalid Redis URL")?;
    sessions.ping().await.context("Failed to connect to Redis")?;

    let bookings: Arc<dyn BookingStore> = Arc::new(PgBookingStore::new(db.pool.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(sessions);
    let users: Arc<dyn AdminUserRepository> = Arc::new(PgUserStore::new(db.pool.clone()));
    let payments: Arc<dyn PaymentProvider> = Arc::new(SimulatedPaymentProvider::new());

    seed_admin(&users, &config.admin).await?;

    let app_state = AppState {
        reservations: Arc::new(ReservationManager::new(
            bookings.clone(),
            sessions,
            config.reservation.capacity,
        )),
        booking_admin: Arc::new(BookingAdmin::new(bookings)),
        users,
        payments,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        session_cookie: config.session.cookie_name.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
