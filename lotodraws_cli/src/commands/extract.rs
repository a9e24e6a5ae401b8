use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use lotodraws_lib::{Pipeline, PipelineConfig};

use crate::output::{print_draws, OutputFormat};

#[derive(Args)]
pub struct ExtractArgs {
    /// Period as the source's selector shows it, e.g. "mars 2025"
    #[arg(long)]
    pub period: String,

    /// Restrict to one draw (selector text, e.g. "Star 14H")
    #[arg(long)]
    pub draw: Option<String>,

    /// Source profile (defaults to the configured default source)
    #[arg(long)]
    pub source: Option<String>,

    /// Seconds to wait for the results to render
    #[arg(long, default_value = "60")]
    pub wait_secs: u64,
}

pub async fn run(args: &ExtractArgs, config: &PipelineConfig, format: &OutputFormat) -> Result<()> {
    let source = args.source.as_deref().unwrap_or(&config.default_source);
    let pipeline = Pipeline::new(config, source)?;

    let extraction = pipeline
        .run_extraction(
            &args.period,
            args.draw.as_deref(),
            Duration::from_secs(args.wait_secs),
        )
        .await
        .with_context(|| format!("extraction of {} from {} failed", args.period, source))?;

    eprintln!(
        "{} draws from {} ({} candidates, {} dropped, {} duplicates)",
        extraction.records.len(),
        extraction.source,
        extraction.candidates,
        extraction.dropped,
        extraction.duplicates
    );
    print_draws(&extraction.records, format)
}
