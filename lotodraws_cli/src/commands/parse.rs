use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use lotodraws_lib::{Pipeline, PipelineConfig, RawDocument, StrategyKind};

use crate::output::{print_draws, OutputFormat};

#[derive(Args)]
pub struct ParseArgs {
    /// Saved HTML page
    #[arg(long)]
    pub file: PathBuf,

    /// Strategy override: next-data, dom-tree, token-stream
    #[arg(long)]
    pub strategy: Option<StrategyKind>,

    /// Source profile whose parse settings apply
    #[arg(long)]
    pub source: Option<String>,

    /// Date the token-stream cursor starts from (YYYY-MM-DD)
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Only this week of the embedded payload, e.g. "28/10/2024 - 03/11/2024"
    #[arg(long)]
    pub week: Option<String>,
}

pub fn run(args: &ParseArgs, config: &PipelineConfig, format: &OutputFormat) -> Result<()> {
    let source = args.source.as_deref().unwrap_or(&config.default_source);
    let html = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let mut pipeline = Pipeline::new(config, source)?.with_week_filter(args.week.clone());
    if let Some(kind) = args.strategy {
        pipeline = pipeline.with_strategy(kind);
    }
    if let Some(today) = args.today {
        pipeline = pipeline.with_today(today);
    }

    let mut doc = RawDocument::from_html(source, html);
    doc.url = args.file.display().to_string();
    let extraction = pipeline.extract_document(&doc)?;

    eprintln!(
        "{} draws via {} ({} candidates, {} skipped, {} dropped, {} duplicates)",
        extraction.records.len(),
        extraction.strategy,
        extraction.candidates,
        extraction.skipped,
        extraction.dropped,
        extraction.duplicates
    );
    print_draws(&extraction.records, format)
}
