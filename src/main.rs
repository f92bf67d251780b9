use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::Notify;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;
mod storage;

use server::{create_reusable_listener, start_server_loop, start_signal_handler};
use storage::{FilesystemObjectStore, ObjectStore, SqlitePostRepository};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config file path (without extension) may be passed as the first argument
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = config::Config::load_from(&config_path)?;

    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.url)
        .await?;
    let posts = SqlitePostRepository::new(Arc::new(pool));
    if cfg.database.create_schema {
        posts.ensure_schema().await?;
    }

    let objects: Option<Arc<dyn ObjectStore>> = if cfg.objects.enabled {
        Some(Arc::new(FilesystemObjectStore::new(&cfg.objects.root).await?))
    } else {
        None
    };

    let listener = create_reusable_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg, Arc::new(posts), objects));
    let active_connections = Arc::new(AtomicUsize::new(0));

    let shutdown = Arc::new(Notify::new());
    start_signal_handler(Arc::clone(&shutdown))?;

    logger::log_server_start(&addr, &cfg);

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(start_server_loop(
            listener,
            state,
            active_connections,
            shutdown,
        ))
        .await;

    Ok(())
}
