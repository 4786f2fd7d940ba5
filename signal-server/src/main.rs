use std::sync::Arc;

use clap::Parser;
use signal_core::SignalConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use signal_server::http::{self, HttpState};
use signal_server::subsystems::chat::ChatOrchestrator;
use signal_server::subsystems::providers;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "signal.toml")]
    config: String,

    /// Check the record store and exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match SignalConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let store = match providers::create_store(&config.database).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match store.health().await {
            Ok(v) => println!("✅ Store ({}) reachable: {}", store.name(), v),
            Err(e) => {
                println!("❌ Store ({}) check failed: {}", store.name(), e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Model selection happens once here and is reused for every request
    let collaborators = providers::create_collaborators(&config).await;
    let orchestrator = ChatOrchestrator::from_config(&config.chat, collaborators);
    tracing::info!(
        model = orchestrator.model_name().unwrap_or("none"),
        sentiment = orchestrator.has_sentiment(),
        speech = orchestrator.has_speech(),
        store = store.name(),
        "Chat orchestrator ready"
    );

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let state = Arc::new(HttpState {
        store,
        orchestrator: Arc::new(orchestrator),
        config,
    });

    http::start_http_server(state, tx.subscribe()).await?;

    Ok(())
}
