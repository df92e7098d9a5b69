use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use kg_ingest_core::{
    ingest_folder_chunks, IngestPipeline, IngestionOptions, LlmGraphTransformer, Neo4jStore,
    OpenAiClient, OpenAiEmbedder, Schema, VectorIndexConfig, DEFAULT_CHAT_MODEL,
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE_URL,
};
use kg_ingest_core::GraphStore;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "kg-ingest", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Neo4j HTTP endpoint
    #[arg(long, env = "NEO4J_URI", default_value = "http://localhost:7474")]
    neo4j_url: String,

    /// Neo4j database name
    #[arg(long, env = "NEO4J_DATABASE", default_value = "neo4j")]
    neo4j_db: String,

    /// Neo4j username
    #[arg(long, env = "NEO4J_USERNAME", default_value = "neo4j")]
    neo4j_user: String,

    /// Neo4j password
    #[arg(long, env = "NEO4J_PASSWORD", default_value = "password", hide_env_values = true)]
    neo4j_password: String,

    /// API key for the embedding and chat-completion endpoints
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    openai_base_url: String,

    /// Chat model used for entity extraction
    #[arg(long, env = "OPENAI_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    chat_model: String,

    /// Embedding model
    #[arg(long, env = "OPENAI_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Embedding dimensions, also used for the vector index
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    embedding_dimensions: usize,

    /// Vector index name
    #[arg(long, default_value = "chunkVector")]
    index_name: String,
}

#[derive(Args)]
struct SourceArgs {
    /// Folder that contains the CSV files.
    #[arg(long, env = "KG_DATA_PATH")]
    folder: String,

    /// Glob applied to paths relative to the folder.
    #[arg(long, default_value = "**/*.csv")]
    glob: String,

    /// Literal separator the splitter breaks text on.
    #[arg(long, default_value = "\n\n")]
    separator: String,

    /// Maximum chunk length in characters.
    #[arg(long, default_value_t = 1_500)]
    chunk_size: usize,

    /// Characters carried over between consecutive chunks.
    #[arg(long, default_value_t = 200)]
    chunk_overlap: usize,
}

impl SourceArgs {
    fn options(&self) -> IngestionOptions {
        IngestionOptions {
            glob_pattern: self.glob.clone(),
            separator: self.separator.clone(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Load, chunk, embed and extract every CSV, writing the graph to Neo4j.
    Ingest {
        #[command(flatten)]
        source: SourceArgs,

        /// Keep extracted node and relationship types outside the schema.
        #[arg(long, default_value_t = false)]
        lenient: bool,
    },
    /// Load and chunk only, printing chunk ids without calling any service.
    Chunks {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Create the chunk vector index if it does not exist.
    EnsureIndex,
}

impl Cli {
    fn index_config(&self) -> VectorIndexConfig {
        VectorIndexConfig {
            name: self.index_name.clone(),
            dimensions: self.embedding_dimensions,
            ..VectorIndexConfig::default()
        }
    }

    fn graph_store(&self) -> Neo4jStore {
        Neo4jStore::new(
            &self.neo4j_url,
            &self.neo4j_db,
            &self.neo4j_user,
            &self.neo4j_password,
        )
    }

    fn openai_client(&self) -> anyhow::Result<OpenAiClient> {
        let api_key = self
            .openai_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .context("OPENAI_API_KEY is required for ingestion")?;
        Ok(OpenAiClient::new(&self.openai_base_url, api_key)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    if let Err(error) = dotenv {
        if !error.not_found() {
            warn!(%error, "could not read .env file");
        }
    }

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "kg-ingest boot"
    );

    match &cli.command {
        Command::Ingest { source, lenient } => {
            let chunks = ingest_folder_chunks(Path::new(&source.folder), source.options())?;
            info!(folder = %source.folder, chunk_count = chunks.len(), "ingesting chunks");

            let client = cli.openai_client()?;
            let embedder =
                OpenAiEmbedder::new(client.clone(), &cli.embedding_model, cli.embedding_dimensions);
            let extractor = LlmGraphTransformer::new(client, &cli.chat_model, Schema::default())
                .with_strict(!*lenient);

            let pipeline =
                IngestPipeline::new(embedder, extractor, cli.graph_store(), cli.index_config())?;
            let report = pipeline.run(&chunks).await?;

            println!(
                "{} chunks from {} documents ingested ({} entity nodes, {} relationships) at {}",
                report.chunks,
                report.documents,
                report.entity_nodes,
                report.relationships,
                report.finished_at.to_rfc3339()
            );
        }
        Command::Chunks { source } => {
            let chunks = ingest_folder_chunks(Path::new(&source.folder), source.options())?;
            for chunk in &chunks {
                println!("{} chars={} row={}", chunk.chunk_id, chunk.text.chars().count(), chunk.row);
            }
            println!("{} chunks", chunks.len());
        }
        Command::EnsureIndex => {
            let config = cli.index_config();
            cli.graph_store().ensure_vector_index(&config).await?;
            println!("vector index {} ensured", config.name);
        }
    }

    Ok(())
}
