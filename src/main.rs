use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use portfolio_backend::config::Config;
use portfolio_backend::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let pool = db::establish_connection(&config).await?;
    tracing::info!("connected to database");

    db::MIGRATOR.run(&pool).await?;

    match &config.bootstrap_admin {
        Some(admin) => {
            db::ensure_admin(&pool, admin).await?;
        }
        None => {
            if db::admin_count(&pool).await? == 0 {
                tracing::warn!("no admin accounts exist; set ADMIN_EMAIL and ADMIN_PASSWORD to create one");
            }
        }
    }

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(pool.clone(), config));
    let app = routes::build_router(state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down, closing database pool");
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
