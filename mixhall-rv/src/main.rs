//! mixhall-rv (Review) - song publishing review service
//!
//! Accepts create/modify submissions for the mixhall catalog, queues them
//! for moderation, and applies approved snapshots to the published songs
//! under a single transaction.

use anyhow::Result;
use clap::Parser;
use mixhall_common::config::{self, DEFAULT_PORT};
use mixhall_common::db::{init_database, load_shared_secret};
use mixhall_rv::{build_router, AppState};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "mixhall-rv", about = "mixhall song publishing review service")]
struct Args {
    /// Root folder holding the database (overrides MIXHALL_ROOT and config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// HTTP listen port
    #[arg(long, env = "MIXHALL_RV_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!(
        "Starting mixhall Review (mixhall-rv) v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Resolve root folder: CLI > env > config file > OS default
    let root_folder = config::resolve_root_folder(args.root_folder.as_deref());
    let db_path = config::ensure_root_folder(&root_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("Database connection established");

    let shared_secret = load_shared_secret(&pool).await?;
    if shared_secret == 0 {
        info!("Reviewer authentication disabled (shared_secret = 0)");
    } else {
        info!("Loaded shared secret for reviewer authentication");
    }

    let state = AppState::new(pool, shared_secret);
    let app = build_router(state);

    let port = args.port.unwrap_or(DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("mixhall-rv listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
