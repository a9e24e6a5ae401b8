use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use lotodraws_lib::{previous_period, DrawResult, Pipeline, PipelineConfig};

use crate::output::{print_draws, print_periods, OutputFormat, PeriodOutcome};

#[derive(Args)]
pub struct BackfillArgs {
    /// Most recent period to fetch, e.g. "mars 2025"
    #[arg(long)]
    pub from: String,

    /// Number of periods to walk back, including --from
    #[arg(long, default_value = "3")]
    pub months: usize,

    /// Restrict to one draw (selector text)
    #[arg(long)]
    pub draw: Option<String>,

    /// Source profile (defaults to the configured default source)
    #[arg(long)]
    pub source: Option<String>,

    /// Seconds to wait for each period's results to render
    #[arg(long, default_value = "60")]
    pub wait_secs: u64,
}

pub async fn run(args: &BackfillArgs, config: &PipelineConfig, format: &OutputFormat) -> Result<()> {
    if args.months == 0 {
        bail!("--months must be at least 1");
    }
    let source = args.source.as_deref().unwrap_or(&config.default_source);
    let pipeline = Pipeline::new(config, source)?;
    let wait = Duration::from_secs(args.wait_secs);

    let mut outcomes = Vec::with_capacity(args.months);
    let mut records: Vec<DrawResult> = Vec::new();
    let mut period = args.from.clone();

    for i in 0..args.months {
        tracing::info!(period = %period, step = i + 1, of = args.months, "backfilling period");
        match pipeline
            .run_extraction(&period, args.draw.as_deref(), wait)
            .await
        {
            Ok(extraction) => {
                records.extend(extraction.records.iter().cloned());
                outcomes.push(PeriodOutcome {
                    period: period.clone(),
                    result: Ok(extraction),
                });
            }
            Err(e) => {
                tracing::warn!(period = %period, "period failed, continuing: {}", e);
                outcomes.push(PeriodOutcome {
                    period: period.clone(),
                    result: Err(e.to_string()),
                });
            }
        }
        if i + 1 < args.months {
            period = previous_period(&period)?;
        }
    }

    print_periods(&outcomes, format);
    print_draws(&records, format)?;

    if outcomes.iter().all(|o| o.result.is_err()) {
        bail!("every period failed");
    }
    Ok(())
}
