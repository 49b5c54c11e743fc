use bizdb_admin::config::Config;
use bizdb_admin::db::MySqlDatabase;
use bizdb_admin::router::{AdminState, admin_router};
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Arc::new(Config::load()?);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        db_host = %cfg.db_host,
        db_port = cfg.db_port,
        db_name = %cfg.db_name,
        db_user = %cfg.db_user,
        backup_dir = %cfg.backup_dir.display(),
        schema_path = %cfg.schema_path.display(),
        loglevel = %cfg.loglevel,
    );

    let db = MySqlDatabase::connect(&cfg).await;
    if !db.is_connected() {
        warn!("serving without a database connection; data routes will report database errors");
    }

    let state = AdminState::new(Arc::new(db), cfg.clone());
    let app = admin_router(state);

    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server running on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
