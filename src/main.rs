use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use boxmeup_api::config::{AppConfig, StoreBackend};

#[derive(Parser)]
#[command(name = "boxmeup-api")]
#[command(about = "Inventory tracking API server")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Address to bind (overrides BIND_ADDR)")]
    bind: Option<String>,

    #[arg(long, help = "Use the in-memory record store instead of Postgres")]
    memory: bool,

    #[arg(long, help = "Apply database migrations before serving")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("boxmeup_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if args.memory {
        config.database.backend = StoreBackend::Memory;
    }
    info!("Starting boxmeup-api in {:?} mode", config.environment);

    let store = boxmeup_api::open_store(&config, args.migrate).await?;
    let bind_addr = format!("{}:{}", config.server.bind_addr, config.server.port);
    let state = boxmeup_api::build_state(config, store)?;

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("boxmeup-api listening on http://{}", bind_addr);

    boxmeup_api::serve(listener, state).await
}
