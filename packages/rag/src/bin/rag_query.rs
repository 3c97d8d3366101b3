//! CLI for asking questions against the document store
//!
//! Wires the Qdrant store, the OpenAI provider and the orchestrator from
//! environment settings. Every command prints JSON on stdout; logs go to
//! stderr.
//!
//! Build with `cargo run -p rag --features cli --bin rag-query -- ask "..."`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qdrant_client::QdrantClient;
use rag::{
    CollectionSchema, ConversationTurn, Mode, OpenAIProvider, QdrantStore, RagOrchestrator,
    Settings, VectorStore,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rag-query")]
#[command(about = "Ask questions over the medical document store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question with citations
    Ask {
        query: String,
        /// chat or scribe
        #[arg(long, default_value = "chat")]
        mode: Mode,
        /// Scribe template name
        #[arg(long)]
        template: Option<String>,
        /// JSON file holding prior turns: [{"role": "user", "content": "..."}]
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Create the collection if it does not exist
    Init,

    /// Print the number of stored points
    Stats,

    /// Delete and recreate the collection
    Wipe,
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize)]
struct CollectionResponse {
    collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    points: Option<u64>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rag=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("Failed to load settings")?;
    let store = Arc::new(build_store(&settings));

    match cli.command {
        Commands::Ask {
            query,
            mode,
            template,
            history,
        } => cmd_ask(&settings, store, &query, mode, template.as_deref(), history).await,
        Commands::Init => cmd_init(&settings, &store).await,
        Commands::Stats => cmd_stats(&store).await,
        Commands::Wipe => cmd_wipe(&store).await,
    }
}

fn build_store(settings: &Settings) -> QdrantStore {
    let mut client = QdrantClient::new(&settings.qdrant_url).with_timeout(settings.rag.embed_timeout);
    if let Some(api_key) = &settings.qdrant_api_key {
        client = client.with_api_key(api_key.expose_secret());
    }

    QdrantStore::new(client, &settings.rag.collection_name)
        .with_schema(CollectionSchema::new(
            settings.rag.embedding_dim,
            settings.rag.distance,
        ))
        .with_indexing_threshold(settings.rag.indexing_threshold)
        .with_batch_size(settings.rag.upsert_batch_size)
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_ask(
    settings: &Settings,
    store: Arc<QdrantStore>,
    query: &str,
    mode: Mode,
    template: Option<&str>,
    history: Option<PathBuf>,
) -> Result<()> {
    let history = match history {
        Some(path) => load_history(&path)?,
        None => Vec::new(),
    };

    let provider = OpenAIProvider::from_settings(settings);
    let rag = RagOrchestrator::with_config(
        store,
        provider.clone(),
        provider,
        settings.rag.clone(),
    );

    let result = rag
        .answer_query(query, &history, mode, template)
        .await
        .context("Query rejected")?;

    print_json(&result)
}

fn load_history(path: &PathBuf) -> Result<Vec<ConversationTurn>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("History file {} is not a list of turns", path.display()))
}

async fn cmd_init(settings: &Settings, store: &QdrantStore) -> Result<()> {
    let created = store
        .ensure_collection(settings.rag.embedding_dim, settings.rag.distance)
        .await
        .context("Failed to ensure collection")?;

    print_json(&CollectionResponse {
        collection: store.collection().to_string(),
        created: Some(created),
        points: None,
    })
}

async fn cmd_stats(store: &QdrantStore) -> Result<()> {
    let points = store.count().await.context("Failed to count points")?;

    print_json(&CollectionResponse {
        collection: store.collection().to_string(),
        created: None,
        points: Some(points),
    })
}

async fn cmd_wipe(store: &QdrantStore) -> Result<()> {
    store
        .wipe_collection()
        .await
        .context("Failed to wipe collection")?;

    print_json(&CollectionResponse {
        collection: store.collection().to_string(),
        created: Some(true),
        points: Some(0),
    })
}
