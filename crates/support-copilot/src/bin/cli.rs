//! Support copilot command line
//!
//! Run with: cargo run -p support-copilot --features cli --bin support-copilot -- <command>

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use support_copilot::{
    config::CopilotConfig,
    logging,
    pipeline::{CopilotPipeline, DraftRequest},
};

#[derive(Parser, Debug)]
#[command(
    name = "support-copilot",
    version,
    about = "Draft grounded customer support replies from a knowledge base"
)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk, embed and store a knowledge base file
    Index {
        /// UTF-8 text file; `[Section]` markers start new chunks
        path: PathBuf,
    },
    /// Search the knowledge base
    Search {
        query: String,
        #[arg(long, default_value_t = 3)]
        top_k: usize,
    },
    /// Detect the tone of a customer message
    Tone { message: String },
    /// Draft a reply for a customer issue
    Draft {
        issue: String,
        /// Reply tone (empathetic, professional, reassuring, formal, friendly)
        #[arg(long)]
        tone: Option<String>,
        #[arg(long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CopilotConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let _log_guard = logging::init(&config.logging);
    config.validate()?;

    let pipeline = CopilotPipeline::connect(&config)
        .await
        .context("initializing pipeline")?;

    match cli.command {
        Command::Index { path } => {
            let report = pipeline.index_documents(&path).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Stored {}/{} chunks from {} ({} batches, {} dropped)",
                    report.stored, report.chunks, report.source, report.batches, report.dropped
                );
            }
        }
        Command::Search { query, top_k } => {
            let outcome = pipeline.search(&query, top_k).await;
            if let Some(reason) = outcome.reason() {
                eprintln!("warning: {}", reason);
            }
            let matches = outcome.value_or_default();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else if matches.is_empty() {
                println!("No relevant knowledge base matches.");
            } else {
                for m in &matches {
                    println!("[{:.2}] #{} {}", m.score, m.sequence_index, m.text);
                }
            }
        }
        Command::Tone { message } => {
            let outcome = pipeline.classify(&message).await;
            if let Some(reason) = outcome.reason() {
                eprintln!("warning: {}", reason);
            }
            println!("{}", outcome.value_or_default());
        }
        Command::Draft { issue, tone, top_k } => {
            let request = DraftRequest {
                issue,
                tone,
                top_k,
            };
            let draft = pipeline.draft(&request).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&draft)?);
            } else {
                println!("Detected tone: {}", draft.detected_tone);
                println!("Response tone: {}\n", draft.response_tone);
                println!("{}\n", draft.result.response_text);
                if !draft.result.sources.is_empty() {
                    println!("Sources:");
                    for source in &draft.result.sources {
                        println!("  - {}", source);
                    }
                }
                for reason in &draft.degraded {
                    eprintln!("warning: {}", reason);
                }
            }
        }
    }

    Ok(())
}
