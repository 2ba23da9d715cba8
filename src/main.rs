//! Alloyance - LCA imputation, circularity prediction and reporting
//!
//! # Usage
//!
//! ```bash
//! # Train the imputer and indicator models from a JSONL dataset
//! alloyance train --dataset data/lca_records.jsonl
//!
//! # Build the retrieval index from reference documents
//! alloyance build-index --documents knowledge/
//!
//! # Assess one record (file or stdin) and print the report
//! alloyance assess record.json
//! cat record.json | alloyance assess --no-report
//! ```
//!
//! # Environment Variables
//!
//! - `ALLOYANCE_CONFIG`: Path to the TOML config file
//! - `OPENROUTER_API_KEY`: Language model API key; unset selects offline templates
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

use alloyance::config::{self, AlloyanceConfig};
use alloyance::context::{load_documents, HashingEmbedder, RetrievalIndex, TextChunker};
use alloyance::ml_engine::{load_dataset, train_models};
use alloyance::pipeline::{load_knowledge_store, AssessmentPipeline};
use alloyance::{EncodingTable, ModelBundle, ProcessRecord};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "alloyance")]
#[command(about = "Alloyance LCA imputation, circularity prediction and reporting")]
#[command(version)]
struct CliArgs {
    /// Config file (overrides ALLOYANCE_CONFIG and ./alloyance.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Train the model bundle from a JSONL dataset of process records
    Train {
        /// Dataset path (default: artifacts.dataset)
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Output bundle path (default: artifacts.model_bundle)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Chunk, embed and index the reference documents
    BuildIndex {
        /// Document directory (default: artifacts.documents_dir)
        #[arg(long)]
        documents: Option<PathBuf>,
        /// Output index path (default: artifacts.index)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Complete one record, predict its indicators and generate the report
    Assess {
        /// JSON record file; reads stdin when omitted
        input: Option<PathBuf>,
        /// Print the completed record and indicators only
        #[arg(long)]
        no_report: bool,
        /// Emit JSON instead of the plain-text report
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_train(cfg: &AlloyanceConfig, dataset: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let dataset = dataset.unwrap_or_else(|| cfg.artifacts.dataset.clone());
    let output = output.unwrap_or_else(|| cfg.artifacts.model_bundle.clone());

    let records = load_dataset(&dataset)
        .with_context(|| format!("Failed to load dataset {}", dataset.display()))?;
    info!(rows = records.len(), path = %dataset.display(), "Loaded training dataset");

    let encoding = EncodingTable::from_schema();
    let (imputer, predictor) = train_models(&records, &encoding, &cfg.training, cfg.imputation.rounds)
        .context("Training failed")?;

    let bundle = ModelBundle::new(encoding, imputer, predictor, records.len());
    bundle
        .save(&output)
        .with_context(|| format!("Failed to save model bundle to {}", output.display()))?;
    println!("Model bundle written to {}", output.display());
    Ok(())
}

fn run_build_index(cfg: &AlloyanceConfig, documents: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let documents = documents.unwrap_or_else(|| cfg.artifacts.documents_dir.clone());
    let output = output.unwrap_or_else(|| cfg.artifacts.index.clone());

    let docs = load_documents(&documents)
        .with_context(|| format!("Failed to read documents from {}", documents.display()))?;
    let chunker = TextChunker::new(cfg.retrieval.chunk_size, cfg.retrieval.chunk_overlap)?;
    let embedder = HashingEmbedder::new(cfg.retrieval.embedding_dim);

    let index = RetrievalIndex::build(&docs, &chunker, &embedder)?;
    index
        .save(&output)
        .with_context(|| format!("Failed to save index to {}", output.display()))?;
    println!(
        "Indexed {} chunks from {} documents into {}",
        index.len(),
        docs.len(),
        output.display()
    );
    Ok(())
}

fn read_record(input: Option<&PathBuf>) -> Result<ProcessRecord> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read record from stdin")?;
            buf
        }
    };
    let value: serde_json::Value = serde_json::from_str(&raw).context("Input is not valid JSON")?;
    Ok(ProcessRecord::from_json(&value)?)
}

async fn run_assess(cfg: &AlloyanceConfig, input: Option<PathBuf>, no_report: bool, json: bool) -> Result<()> {
    let record = read_record(input.as_ref())?;
    let pipeline = AssessmentPipeline::from_config(cfg).context("Failed to load models")?;

    if no_report {
        let (completed, indicators) = pipeline.predict(&record)?;
        let out = serde_json::json!({
            "record": completed.record.to_json(),
            "imputed_fields": completed.imputed.iter().map(|f| f.key()).collect::<Vec<_>>(),
            "indicators": indicators.to_named_map(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let store = load_knowledge_store(cfg).context("Failed to load retrieval index")?;
    let pipeline = pipeline.with_knowledge_store(store);
    let assessment = pipeline.assess(&record).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment.report)?);
    } else {
        print!("{}", assessment.report.render_text());
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let cfg = match &args.config {
        Some(path) => AlloyanceConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AlloyanceConfig::load(),
    };
    config::init(cfg);
    let cfg = config::get();

    match args.command {
        SubCommand::Train { dataset, output } => run_train(cfg, dataset, output),
        SubCommand::BuildIndex { documents, output } => run_build_index(cfg, documents, output),
        SubCommand::Assess {
            input,
            no_report,
            json,
        } => run_assess(cfg, input, no_report, json).await,
    }
}
