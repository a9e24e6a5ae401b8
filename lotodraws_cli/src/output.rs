use anyhow::Result;
use lotodraws_lib::{DrawResult, Extraction};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

#[derive(Tabled, Serialize)]
struct DrawRow {
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    #[serde(rename = "Time")]
    time: String,
    #[tabled(rename = "Game")]
    #[serde(rename = "Game")]
    game: String,
    #[tabled(rename = "Numbers")]
    #[serde(rename = "Numbers")]
    numbers: String,
    #[tabled(rename = "Bonus")]
    #[serde(rename = "Bonus")]
    bonus: String,
}

#[derive(Tabled, Serialize)]
struct PeriodRow {
    #[tabled(rename = "Period")]
    #[serde(rename = "Period")]
    period: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
    #[tabled(rename = "Records")]
    #[serde(rename = "Records")]
    records: usize,
    #[tabled(rename = "Dropped")]
    #[serde(rename = "Dropped")]
    dropped: usize,
}

/// Outcome of one period in a backfill run.
pub struct PeriodOutcome {
    pub period: String,
    pub result: std::result::Result<Extraction, String>,
}

// -- Row builders --

fn build_draw_rows(records: &[DrawResult]) -> Vec<DrawRow> {
    records
        .iter()
        .map(|r| DrawRow {
            date: r.draw_date_time.format("%Y-%m-%d").to_string(),
            time: r.draw_date_time.format("%H:%M").to_string(),
            game: r.game_type.to_string(),
            numbers: format_numbers(&r.numbers),
            bonus: r.bonus.map(|b| b.to_string()).unwrap_or_default(),
        })
        .collect()
}

fn build_period_rows(outcomes: &[PeriodOutcome]) -> Vec<PeriodRow> {
    outcomes
        .iter()
        .map(|o| match &o.result {
            Ok(extraction) => PeriodRow {
                period: o.period.clone(),
                status: format!("ok ({})", extraction.strategy),
                records: extraction.records.len(),
                dropped: extraction.dropped,
            },
            Err(e) => PeriodRow {
                period: o.period.clone(),
                status: format!("failed: {}", e),
                records: 0,
                dropped: 0,
            },
        })
        .collect()
}

// -- Draw output --

pub fn print_draws(records: &[DrawResult], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(build_draw_rows(records))),
        OutputFormat::Markdown => {
            let mut table = Table::new(build_draw_rows(records));
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in build_draw_rows(records) {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&records),
    }
    Ok(())
}

pub fn print_periods(outcomes: &[PeriodOutcome], format: &OutputFormat) {
    let rows = build_period_rows(outcomes);
    let mut table = Table::new(rows);
    if matches!(format, OutputFormat::Markdown) {
        table.with(Style::markdown());
    }
    eprintln!("{}", table);
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn format_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}
