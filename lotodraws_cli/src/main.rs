mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lotodraws_lib::PipelineConfig;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "lotodraws")]
#[command(about = "Extract lottery draw results from rendered result pages")]
struct Cli {
    /// Output format: table, json, csv, markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// TOML config file (defaults to $LOTODRAWS_CONFIG when set)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one period from a source and print its draws
    Extract(commands::extract::ExtractArgs),
    /// Walk back through several periods, one extraction each
    Backfill(commands::backfill::BackfillArgs),
    /// Parse a saved page without a browser
    Parse(commands::parse::ParseArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lotodraws=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "markdown" | "md" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    let config = PipelineConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Extract(args) => commands::extract::run(args, &config, &format).await?,
        Commands::Backfill(args) => commands::backfill::run(args, &config, &format).await?,
        Commands::Parse(args) => commands::parse::run(args, &config, &format)?,
    }

    Ok(())
}
