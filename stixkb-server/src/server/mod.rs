pub mod app;
mod websocket;

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;
use sea_orm_migration::prelude::*;
use stixkb::database::{establish_connection, get_database_url, migrations::Migrator};
use stixkb::AppContext;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::PlatformConfig;

#[derive(Subcommand, Debug)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

pub async fn start_server(config: PlatformConfig) -> Result<()> {
    let database_url = get_database_url(Some(&config.database.path));
    let db = establish_connection(&database_url).await?;

    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    let app = Arc::new(AppContext::with_settings(
        db,
        config.page_settings(),
        config.bus.buffer_size,
    ));
    app.register_connectors(config.connector_registrations())
        .await?;

    let shutdown = CancellationToken::new();
    let router = app::create_app(app, &config, shutdown.clone())?;

    log_routes();

    let port = config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown requested, closing subscriptions");
    shutdown.cancel();
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                     - Health check");
    info!("  /graphql                    - GraphQL API & Playground");
    info!("  /graphql/ws                 - GraphQL subscriptions (graphql-transport-ws)");
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Dropping all tables and re-running migrations");
            Migrator::fresh(&db).await?;
        }
    }

    info!("Migration completed");
    Ok(())
}
