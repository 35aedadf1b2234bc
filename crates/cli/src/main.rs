//! docstash command-line entry point.
//!
//! Administrative surface for the extraction cache plus a direct driver for
//! the extraction pipeline. Logging goes to stderr so command output on
//! stdout stays machine-readable.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use docstash_core::{AppConfig, CacheService};
use docstash_extract::{ExtractionPipeline, RemoteOcr};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docstash", about = "Document text extraction with a content-addressed cache", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract text from one or more documents.
    Extract {
        /// Documents to process (PDF or image files).
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print cache statistics.
    Stats,
    /// Delete expired cache entries.
    Sweep,
    /// Delete every cache entry and reset statistics.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    tracing::info!(cache_type = ?config.cache_type, "starting docstash");

    let cache = Arc::new(CacheService::from_config(&config).await?);

    match cli.command {
        Command::Extract { files } => {
            let ocr = Arc::new(RemoteOcr::from_config(&config)?);
            let pipeline = ExtractionPipeline::new(cache.clone(), ocr, &config);

            let results = pipeline.extract_many(&files).await;
            let report: serde_json::Map<String, serde_json::Value> = results
                .into_iter()
                .map(|(name, extraction)| (name, serde_json::to_value(extraction).unwrap_or_default()))
                .collect();

            println!("{}", serde_json::to_string_pretty(&report)?);
            println!("{}", serde_json::to_string_pretty(&cache.stats())?);
        }
        Command::Stats => {
            let mut stats = serde_json::to_value(cache.stats())?;
            if let Ok(size) = cache.approximate_size().await
                && let Some(object) = stats.as_object_mut()
            {
                object.insert("approximate_size_bytes".into(), size.into());
            }
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Sweep => {
            let cleared = cache.clear_expired().await;
            println!("{}", serde_json::json!({ "cleared": cleared }));
        }
        Command::Clear => {
            let cleared = cache.clear_all().await;
            println!("{}", serde_json::json!({ "cleared": cleared }));
        }
    }

    Ok(())
}
