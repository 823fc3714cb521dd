use anyhow::Result;
use prizepilot_ws::{create_app_router, monitoring, state::AppState, tasks::start_account_sweep_scheduler};
use shared::Config;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
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
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.app.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    monitoring::init_monitoring();

    if config.is_production() {
        info!("🏭 Running in production mode");
    } else {
        info!("🛠️ Running in {} mode", config.app.environment);
    }

    info!(
        "🎮 Game server {} (cooldown {}h)",
        config.game_api.url, config.game_api.cooldown_hours
    );
    info!(
        "💾 Accounts in {}, state in {}",
        config.storage.config_path.display(),
        config.storage.state_path.display()
    );

    let bind_address = config.bind_address();
    let poll_cron = config.app.poll_cron.clone();
    let app_state = Arc::new(AppState::new(config)?);
    info!("🚀 Application state initialized");

    let mut scheduler = match poll_cron {
        Some(schedule) => {
            match start_account_sweep_scheduler(Arc::clone(&app_state.accounts), &schedule).await {
                Ok(scheduler) => Some(scheduler),
                Err(e) => {
                    error!("❌ Failed to start account sweep scheduler: {}", e);
                    None
                }
            }
        }
        None => {
            info!("⏰ POLL_CRON not set, accounts are only reconciled on request");
            None
        }
    };

    let app = create_app_router(app_state);

    info!("listening on {}", bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            warn!("⚠️ Scheduler shutdown failed: {}", e);
        }
    }

    Ok(())
}
