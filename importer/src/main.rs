#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::{
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process,
};
use tracing::info;
use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use ::refdesk::{answer, search_text, Document, OpenAI, Store};

const EMBED_BATCH_SIZE: usize = 100;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Bulk-load a JSONL dump of documents into the collection.
    Load {
        path: PathBuf,
        #[arg(long, default_value_t = 50)]
        batch_size: usize,
    },
    /// Generate embeddings for documents that don't have one yet.
    Embed,
    /// Create the text and vector search indexes.
    Index,
    /// Run a keyword search from the terminal.
    Query { query: String },
    /// Ask a question grounded in the collection.
    Ask { query: String },
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "importer=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Load { path, batch_size } => {
            if fs::metadata(&path).is_err() {
                eprintln!("Error: File does not exist");
                process::exit(1);
            }

            let store = Store::connect()
                .await
                .expect("Failed to connect to MongoDB");

            let count = load_jsonl(&store, &path, batch_size.max(1))
                .await
                .expect("Failed to load documents");

            info!("Loaded {count} documents");
        }
        Commands::Embed => {
            let store = Store::connect()
                .await
                .expect("Failed to connect to MongoDB");
            let client = OpenAI::new();

            loop {
                let documents = store
                    .unembedded(EMBED_BATCH_SIZE)
                    .await
                    .expect("Failed to fetch documents");

                if documents.is_empty() {
                    break;
                }

                let texts = documents.iter().map(|d| d.text.clone()).collect();
                let embeddings = client
                    .embed_batch(texts)
                    .await
                    .expect("Failed to generate embeddings");

                for (document, embedding) in documents.iter().zip(embeddings) {
                    store
                        .set_embedding(
                            document.id.expect("Stored documents always have an id"),
                            &embedding,
                        )
                        .await
                        .expect("Failed to store embedding");
                }

                info!("Embedded {} documents", documents.len());
            }
        }
        Commands::Index => {
            let store = Store::connect()
                .await
                .expect("Failed to connect to MongoDB");

            store
                .create_indexes()
                .await
                .expect("Failed to create indexes");

            info!("Indexes created");
        }
        Commands::Query { query } => {
            let store = Store::connect()
                .await
                .expect("Failed to connect to MongoDB");

            let results = search_text(&store, &query, 5)
                .await
                .expect("Failed to search documents");

            println!("{results:#?}");
        }
        Commands::Ask { query } => {
            let store = Store::connect()
                .await
                .expect("Failed to connect to MongoDB");
            let client = OpenAI::new();

            let response = answer(&store, &client, &query, 5)
                .await
                .expect("Failed to answer query");

            println!("{}", response.answer);
            for source in response.sources {
                println!("- {} ({})", source.title, source.url);
            }
        }
    }
}

async fn load_jsonl(store: &Store, path: &Path, batch_size: usize) -> Result<usize> {
    let file = File::open(path)?;
    let mut batch = Vec::with_capacity(batch_size);
    let mut count = 0;

    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;

        let Some(document) =
            parse_line(&line).with_context(|| format!("Invalid document on line {}", number + 1))?
        else {
            continue;
        };

        batch.push(document);

        if batch.len() == batch_size {
            count += store.insert_batch(std::mem::take(&mut batch)).await?;
        }
    }

    if !batch.is_empty() {
        count += store.insert_batch(batch).await?;
    }

    Ok(count)
}

fn parse_line(line: &str) -> Result<Option<Document>> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(line).map(Some).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn documents_parse_from_jsonl_lines() {
        let document = parse_line(r#"{"title": "Replica sets", "text": "Replica sets provide redundancy."}"#)
            .unwrap()
            .unwrap();

        assert_eq!(document.title.as_deref(), Some("Replica sets"));
        assert!(document.embedding.is_none());
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(parse_line("{not json").is_err());
        assert!(parse_line(r#"{"title": "no text field"}"#).is_err());
    }
}
