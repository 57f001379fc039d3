//! Entitlement service binary.
//!
//! Wires configuration, the selected storage backend, the PayPal
//! verifier, and the HTTP surface into a running axum server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use charlabot_entitlements::adapters::analytics::{FileAnalyticsLog, NullAnalyticsLog};
use charlabot_entitlements::adapters::http::{entitlement_router, EntitlementAppState};
use charlabot_entitlements::adapters::paypal::{self, PayPalVerifier, UnconfiguredVerifier};
use charlabot_entitlements::adapters::postgres::PostgresEntitlementStore;
use charlabot_entitlements::adapters::storage::FileEntitlementStore;
use charlabot_entitlements::config::{AppConfig, StorageBackend};
use charlabot_entitlements::ports::{AnalyticsSink, EntitlementStore, PaymentVerifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.server.log_level)
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = build_store(&config).await?;
    let analytics = build_analytics(&config);
    let verifier = build_verifier(&config);

    let state = EntitlementAppState {
        store,
        analytics,
        verifier,
        trial_policy: config.trial.to_policy(),
    };

    let app = Router::new()
        .nest("/api", entitlement_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, backend = ?config.storage.backend, "Starting entitlement service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(
    config: &AppConfig,
) -> Result<Arc<dyn EntitlementStore>, Box<dyn std::error::Error>> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .min_connections(config.database.min_connections)
                .max_connections(config.database.max_connections)
                .acquire_timeout(config.database.acquire_timeout())
                .idle_timeout(config.database.idle_timeout())
                .max_lifetime(config.database.max_lifetime())
                .connect(&config.database.url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            Ok(Arc::new(PostgresEntitlementStore::new(pool)))
        }
        StorageBackend::File => Ok(Arc::new(FileEntitlementStore::new(
            &config.storage.data_dir,
        ))),
    }
}

fn build_analytics(config: &AppConfig) -> Arc<dyn AnalyticsSink> {
    match &config.storage.analytics_log {
        Some(path) => Arc::new(FileAnalyticsLog::new(path)),
        None => Arc::new(NullAnalyticsLog),
    }
}

fn build_verifier(config: &AppConfig) -> Arc<dyn PaymentVerifier> {
    if config.paypal.is_configured() {
        let paypal_config = paypal::PayPalConfig::new(
            config.paypal.client_id.clone(),
            config.paypal.client_secret.clone(),
        )
        .with_base_url(config.paypal.base_url.clone());
        Arc::new(PayPalVerifier::new(paypal_config))
    } else {
        tracing::warn!("PayPal credentials not configured; webhook events will not be verified");
        Arc::new(UnconfiguredVerifier)
    }
}
