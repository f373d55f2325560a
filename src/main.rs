use anyhow::Context;
use atlas::db::{Database, PgVectorStore};
use atlas::{AppState, Settings};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Atlas - agent API server
///
/// Serves pre-built AI agents (web search, finance, knowledge assist,
/// Telegram, orchestration) over a versioned HTTP API. Configuration is
/// read from the environment; see the README for the variable list.
#[derive(Parser, Debug)]
#[command(name = "atlas-server", version, about = "Atlas - agent API server")]
struct Cli {
    /// Override the bind host from the environment
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port from the environment
    #[arg(long)]
    port: Option<u16>,

    /// Load environment variables from this file instead of `.env`
    #[arg(long, value_name = "PATH")]
    env_file: Option<std::path::PathBuf>,

    /// Run without PostgreSQL; sessions are not persisted and the
    /// knowledge base lives in memory
    #[arg(long)]
    no_database: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.json_logs);

    if let Some(path) = &cli.env_file {
        dotenvy::from_path(path)
            .with_context(|| format!("failed to load env file {}", path.display()))?;
    }

    let mut settings = Settings::from_env().context("failed to load configuration")?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    let (database, vector_store): (Option<Arc<Database>>, Arc<dyn atlas::VectorStore>) =
        if cli.no_database {
            tracing::warn!("running without PostgreSQL; knowledge base is in-memory only");
            (None, Arc::new(atlas::InMemoryVectorStore::new()))
        } else {
            let url = settings.database_url();
            let database = Arc::new(
                Database::connect(&url)
                    .await
                    .context("failed to connect to PostgreSQL")?,
            );
            let vector_store = Arc::new(PgVectorStore::new(database.pool().clone()));
            tracing::info!(host = %settings.database.host, "connected to PostgreSQL");
            (Some(database), vector_store)
        };

    let addr = settings.bind_addr();
    let state = AppState::new(settings, database, vector_store);
    let app = atlas::api::routes::app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "atlas-server listening");

    axum::serve(listener, app)
        .await
        .context("server exited with an error")?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "atlas=info,atlas_server=info,tower_http=info".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
