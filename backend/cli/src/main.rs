mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use scribe_compaction::{CompactionEngine, CompactionPolicy};
use scribe_gateway::{start_server, GatewayState};
use scribe_store::{MessageStore, SqliteMessageStore};
use scribe_summarizer::OllamaSummarizer;

use config::Config;

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Scribe: conversation history with rolling summaries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Probe a running server's health endpoint
    Status,
    /// Run one compaction of a session against the configured database
    Compact {
        /// Session to compact
        session_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    logging::init_logger(config.log_dir.as_deref(), &config.log_level);

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Status => {
            println!("Scribe status: checking...");
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("Scribe is not running on port {}", config.port);
                }
            }
        }
        Commands::Compact { session_id } => {
            let engine = build_engine(&config)?.1;
            let outcome = engine.maybe_compact(&session_id).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

fn build_engine(config: &Config) -> Result<(Arc<dyn MessageStore>, Arc<CompactionEngine>)> {
    let store = if config.is_in_memory() {
        SqliteMessageStore::in_memory()?
    } else {
        SqliteMessageStore::open(&config.db_path, config.pool_size)
            .with_context(|| format!("opening database {}", config.db_path))?
    };
    let store: Arc<dyn MessageStore> = Arc::new(store);

    let summarizer = OllamaSummarizer::new()
        .with_base_url(&config.ollama_url)
        .with_model(&config.summary_model);
    info!(url = %config.ollama_url, model = %summarizer.model(), "Registered Ollama summarizer");

    let policy = CompactionPolicy::default()
        .with_window(config.compaction_window, config.compaction_min);
    let engine = CompactionEngine::new(Arc::clone(&store), Arc::new(summarizer)).with_policy(policy);

    Ok((store, Arc::new(engine)))
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        db = %config.db_path,
        pool_size = config.pool_size,
        "Starting Scribe"
    );

    let (store, engine) = build_engine(&config)?;
    let state = GatewayState::new(store, engine);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.bind_address, config.port))?;
    start_server(addr, state).await
}
