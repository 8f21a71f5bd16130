//! Command-line entry point for the PariMitra knowledge base.
//!
//! `mitra build` runs the offline index build step for one knowledge source;
//! `mitra ask` answers a question against a built index. API credentials are
//! read from the environment (a `.env` file is honored).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mitra_rag::{
    KnowledgeConfig, KnowledgeService, KnowledgeSource, LocalEmbedder, OpenAiChatModel,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "mitra", about = "Index builder and query tool for the PariMitra knowledge base")]
struct Cli {
    /// Directory index snapshots are persisted under.
    #[arg(long, default_value = "vectorstore")]
    index_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the index for a knowledge source if it does not exist yet.
    Build {
        /// Path of the source document (PDF or text with form-feed page
        /// breaks).
        #[arg(long)]
        source: PathBuf,

        /// Namespace the index is persisted under.
        #[arg(long)]
        namespace: String,

        /// Rebuild even if a persisted index already exists.
        #[arg(long)]
        force: bool,
    },

    /// Ask a question against a built knowledge source.
    Ask {
        /// Namespace of the knowledge source.
        namespace: String,

        /// The question to answer.
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = KnowledgeConfig::builder().index_dir(&cli.index_dir).build()?;

    match cli.command {
        Command::Build { source, namespace, force } => {
            let embedder =
                Arc::new(LocalEmbedder::load().context("failed to load the embedding model")?);
            let service = KnowledgeService::builder()
                .config(config)
                .embedder(embedder)
                .source(KnowledgeSource::new(&namespace, &source))
                .build()?;

            if force {
                let count = service.rebuild_index(&namespace).await?;
                println!("Index '{namespace}' rebuilt ({count} chunks).");
            } else if service.ensure_index(&namespace).await? {
                println!("Index '{namespace}' built.");
            } else {
                println!("Index '{namespace}' already exists.");
            }
        }

        Command::Ask { namespace, question } => {
            let embedder =
                Arc::new(LocalEmbedder::load().context("failed to load the embedding model")?);
            let api_key = std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY is required to answer questions")?;
            let chat = OpenAiChatModel::with_timeout(api_key, config.request_timeout)?
                .with_model(config.chat_model.clone())
                .with_temperature(config.temperature);

            let service = KnowledgeService::builder()
                .config(config)
                .embedder(embedder)
                .chat_model(Arc::new(chat))
                .build()?;

            info!(namespace = %namespace, "answering question");
            println!("{}", service.answer(&namespace, &question).await);
        }
    }

    Ok(())
}
