//! TLink CLI - Command-line interface
//!
//! Usage:
//!   tlink normalize <text>...
//!   tlink train --task <doc-time|event-time|timex> --output <dir> <documents>...
//!   tlink evaluate --gold <doc>... --system <doc>...

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tlink_core::{Document, LoggingConfig, ProcessingMode, TlinkConfig};
use tlink_extractor::{
    AggregateMetrics, Annotator, ContextWindowExtractor, DocTimeRelAnnotator, Evaluator,
    EventTimeAnnotator, JsonlDataWriter, TimexAnnotator, TimexNormalizer,
};

#[derive(Parser)]
#[command(name = "tlink")]
#[command(about = "Clinical temporal relation extraction CLI")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the index token of time expressions
    Normalize {
        /// Time expression text
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Write training instances for annotated documents
    Train {
        #[arg(long, value_enum)]
        task: Task,
        /// Output directory for training-data.jsonl
        #[arg(long)]
        output: PathBuf,
        /// Annotated documents (JSON)
        #[arg(required = true)]
        documents: Vec<PathBuf>,
    },
    /// Score system documents against gold documents
    Evaluate {
        #[arg(long, required = true)]
        gold: Vec<PathBuf>,
        #[arg(long, required = true)]
        system: Vec<PathBuf>,
        /// Match relations regardless of argument order
        #[arg(long)]
        ignore_direction: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Task {
    DocTime,
    EventTime,
    Timex,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TlinkConfig::from_file(path)?.with_env_override()?,
        None => TlinkConfig::from_env()?,
    };
    init_logging(&config.logging);

    match cli.command {
        Commands::Normalize { text } => {
            let (normalizer, _) = TimexNormalizer::from_config(&config.extractor);
            for timex in text {
                println!("{}\t{}", timex, normalizer.normalize(&timex));
            }
        }
        Commands::Train {
            task,
            output,
            documents,
        } => {
            let annotator = build_annotator(task, &config);
            let mut writer = JsonlDataWriter::create(&output)
                .with_context(|| format!("cannot create {}", output.display()))?;

            for path in &documents {
                let document = read_document(path)?;
                annotator
                    .process(&document, &mut ProcessingMode::Training(&mut writer))
                    .with_context(|| format!("{} failed on {}", annotator.name(), path.display()))?;
            }

            let written = writer.written();
            writer.finish()?;
            tracing::info!(
                "Wrote {} {} instances from {} documents",
                written,
                annotator.name(),
                documents.len()
            );
        }
        Commands::Evaluate {
            gold,
            system,
            ignore_direction,
        } => {
            if gold.len() != system.len() {
                bail!(
                    "{} gold documents but {} system documents",
                    gold.len(),
                    system.len()
                );
            }

            let evaluator = if ignore_direction {
                Evaluator::new().ignoring_direction()
            } else {
                Evaluator::new()
            };
            let mut aggregate = AggregateMetrics::default();
            for (gold_path, system_path) in gold.iter().zip(&system) {
                let gold_doc = read_document(gold_path)?;
                let system_doc = read_document(system_path)?;
                aggregate.add_document(&evaluator, &gold_doc, &system_doc);
            }

            print!("{}", aggregate.report());
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_annotator(task: Task, config: &TlinkConfig) -> Box<dyn Annotator> {
    let extractor_config = &config.extractor;
    let window_extractor = || {
        let (normalizer, _) = TimexNormalizer::from_config(extractor_config);
        ContextWindowExtractor::new(normalizer)
    };

    match task {
        Task::DocTime => Box::new(DocTimeRelAnnotator::from_config(
            window_extractor(),
            extractor_config,
        )),
        Task::EventTime => Box::new(EventTimeAnnotator::from_config(
            window_extractor(),
            extractor_config,
        )),
        Task::Timex => Box::new(TimexAnnotator::from_config(extractor_config)),
    }
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid document {}", path.display()))
}
