//! School Fees API Server Binary
//!
//! # Usage
//!
//! ```bash
//! API_DATABASE_URL=postgres://... API_PAYSTACK_SECRET_KEY=sk_test_... cargo run --bin school-fees-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! * `API_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! * `API_PAYSTACK_BASE_URL` - Paystack API root
//! * `API_PAYSTACK_SECRET_KEY` - Paystack secret key, also used for webhook signatures (required)
//! * `API_PAYSTACK_CALLBACK_URL` - Checkout redirect target
//! * `API_GATEWAY_TIMEOUT_SECS` - Upper bound on each gateway call (default: 30)
//! * `API_CURRENCY` - Settlement currency (default: NGN)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_payments::PaystackGateway;
use infra_db::{
    create_pool, run_migrations, DatabaseConfig, PostgresAccountStore, PostgresPaymentStore,
    PostgresSchoolDirectory,
};
use interface_api::{config::ApiConfig, create_router, AppState, Ports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API_* configuration")?;

    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting School Fees API Server"
    );

    let pool = create_pool(DatabaseConfig::new(&config.database_url))
        .await
        .context("database connection failed")?;
    run_migrations(&pool).await.context("database migrations failed")?;

    let gateway = PaystackGateway::new(config.paystack()).context("gateway client setup failed")?;

    let ports = Ports {
        directory: Arc::new(PostgresSchoolDirectory::new(pool.clone())),
        payments: Arc::new(PostgresPaymentStore::new(pool.clone())),
        accounts: Arc::new(PostgresAccountStore::new(pool)),
        gateway: Arc::new(gateway),
    };

    let addr: SocketAddr = config.server_addr().parse()?;
    let app = create_router(AppState::new(config, ports));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
