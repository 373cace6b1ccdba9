use std::sync::Arc;

use engine::{DocumentStore, MemoryStore, SqliteStore};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "boardlink={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    tasks.spawn(async move {
        tracing::info!("Starting store server...");
        let store = match open_store(&server.database).await {
            Ok(store) => store,
            Err(err) => {
                tracing::error!("failed to initialize store: {err}");
                return;
            }
        };
        let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
        let addr = format!("{}:{}", bind, server.port);
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!("failed to bind server listener: {err}");
                return;
            }
        };
        if let Err(err) = server::run_with_listener(store, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn open_store(
    config: &settings::Database,
) -> Result<Arc<dyn DocumentStore>, Box<dyn std::error::Error + Send + Sync>> {
    let path = match config {
        Database::Memory => {
            tracing::warn!("using the in-memory store, sessions are lost on restart");
            return Ok(Arc::new(MemoryStore::new()));
        }
        Database::Sqlite(path) => path,
    };

    let database = sea_orm::Database::connect(format!("sqlite:{}?mode=rwc", path)).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("sqlite store ready at {path}");
    Ok(Arc::new(SqliteStore::new(database)))
}
