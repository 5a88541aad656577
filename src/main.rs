use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};

use supplyflow as app;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = app::config::load_config()?;
    app::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db_pool = app::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        app::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }

    let (event_sender, event_rx) = app::events::channel(1024);
    tokio::spawn(app::events::process_events(event_rx));

    let state = app::AppState::new(Arc::new(db_pool), event_sender);
    app::db::check_connection(&state.db).await?;

    info!(
        environment = %cfg.environment,
        "supplyflow core ready; waiting for shutdown signal"
    );

    signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
