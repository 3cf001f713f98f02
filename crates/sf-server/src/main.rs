//! SalesFlow Server
//!
//! HTTP server for the Opportunity-to-Order workflow.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sf_auth::{Authenticator, JwtService};
use sf_core::config::{AppConfig, DatabaseConfig, LoggingConfig, ServerConfig};
use sf_db::{Database, PoolSettings, Stores};
use sf_journals::{JournalService, PgJournalStore};
use sf_services::users::seed_admin;
use sf_services::ServiceContext;

mod health;
mod metrics;

use health::{HealthChecker, HealthConfig};
use metrics::Metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting SalesFlow"
    );

    let metrics = Arc::new(Metrics::new());
    let database = connect_database(&config.database).await?;
    let (stores, mut journals) = match &database {
        Some(db) => (
            Stores::postgres(db.pool().clone()),
            JournalService::new(Arc::new(PgJournalStore::new(db.pool().clone()))),
        ),
        None => (Stores::memory(), JournalService::in_memory()),
    };
    info!(storage = ?stores.kind, "storage ready");

    let journal_metrics = metrics.clone();
    journals.on_journal_created(move |_| journal_metrics.record_journal());

    let services = ServiceContext::from_config(&config, stores, Arc::new(journals))
        .context("invalid pipeline.board_stages")?;
    bootstrap_admin(&services, &config).await;

    let jwt = JwtService::new(
        config.auth.jwt_secret.as_bytes(),
        config.auth.token_expiration_seconds,
    );
    let api_state = sf_api::AppState::new(services, Arc::new(Authenticator::new(Arc::new(jwt))));
    let health = Arc::new(HealthChecker::new(HealthConfig::default()).with_database(database.clone()));

    let app = build_router(api_state, health, metrics, &config.server);

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

/// `None` runs on in-memory storage: no URL configured, or the database is
/// unreachable. A failed migration is fatal.
async fn connect_database(config: &DatabaseConfig) -> anyhow::Result<Option<Database>> {
    let Some(settings) = PoolSettings::from_config(config) else {
        info!("No database configured, using in-memory storage");
        return Ok(None);
    };

    let db = match Database::connect(&settings).await {
        Ok(db) => db,
        Err(e) => {
            warn!("Failed to connect to database: {}. Using in-memory storage.", e);
            return Ok(None);
        }
    };

    if config.migrate {
        db.migrate().await.context("database migration failed")?;
    }
    Ok(Some(db))
}

async fn bootstrap_admin(services: &ServiceContext, config: &AppConfig) {
    let (Some(login), Some(password)) = (
        config.auth.bootstrap_admin_login.as_deref(),
        config.auth.bootstrap_admin_password.as_deref(),
    ) else {
        return;
    };

    match seed_admin(services, login, password).await {
        Ok(Some(admin)) => info!(user_id = admin.id, login, "bootstrap admin seeded"),
        Ok(None) => {}
        Err(errors) => error!(login, %errors, "failed to seed bootstrap admin"),
    }
}

/// Build the application router
fn build_router(
    api_state: sf_api::AppState,
    health: Arc<HealthChecker>,
    metrics: Arc<Metrics>,
    server: &ServerConfig,
) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(health);

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/metrics.json", get(metrics::json_metrics))
        .with_state(metrics.clone());

    Router::new()
        .merge(health_routes)
        .merge(metrics_routes)
        .merge(sf_api::router().with_state(api_state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    server.request_timeout_seconds,
                )))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_body_size_bytes))
        .layer(middleware::from_fn_with_state(
            metrics,
            metrics::metrics_middleware,
        ))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
