//! Embedded `__NEXT_DATA__` payload strategy.
//!
//! The weekly results page ships its whole result set as JSON inside a
//! `<script id="__NEXT_DATA__">` block:
//!
//! ```text
//! props.pageProps.resultsData.drawsResultsWeekly[]
//!   startDate / endDate            "28/10/2024"
//!   drawResultsDaily[]
//!     date                         "jeudi 31/10"
//!     drawResults.standardDraws[]  { drawName, winningNumbers }
//!     drawResults.nightDraws[]
//! ```

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

use super::{
    capture_hour, name_hour_pattern, year_in_week, DocumentParser, ParseOutput, StrategyKind,
};
use crate::date::{parse_dmy, resolve_month, split_day_month};
use crate::error::StructuralError;
use crate::types::{DateFragment, RawCandidate, RawDocument};

const STRATEGY: &str = "next-data";

#[derive(Deserialize)]
struct NextData {
    props: Props,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Props {
    page_props: PageProps,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageProps {
    results_data: ResultsData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultsData {
    // Units stay untyped so one malformed week or draw is skipped on its own.
    draws_results_weekly: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Week {
    start_date: String,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    draw_results_daily: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Day {
    date: String,
    #[serde(default)]
    draw_results: DayDraws,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DayDraws {
    #[serde(default)]
    standard_draws: Vec<Value>,
    #[serde(default)]
    night_draws: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Draw {
    draw_name: String,
    winning_numbers: String,
}

/// Walks the embedded results payload.
#[derive(Debug, Clone, Default)]
pub struct NextDataParser {
    /// Only walk the week whose `"start - end"` label equals this.
    pub week_filter: Option<String>,
    /// Only walk weeks with at least one day in this month and year.
    ///
    /// The payload is rendered with the page and does not follow later
    /// selector changes, so it can hold weeks of a different period.
    pub period: Option<(u32, i32)>,
}

impl DocumentParser for NextDataParser {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NextData
    }

    fn parse(&self, doc: &RawDocument) -> Result<ParseOutput, StructuralError> {
        let payload = extract_payload(&doc.html)?;
        let data: NextData = serde_json::from_str(&payload).map_err(|e| {
            StructuralError::new(STRATEGY, format!("payload is not the expected shape: {}", e))
        })?;

        let hour_re = name_hour_pattern();
        let mut out = ParseOutput::default();
        for raw_week in data.props.page_props.results_data.draws_results_weekly {
            let week: Week = match serde_json::from_value(raw_week) {
                Ok(w) => w,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed week");
                    out.skipped += 1;
                    continue;
                }
            };

            if let Some(filter) = &self.week_filter {
                let label = format!(
                    "{} - {}",
                    week.start_date,
                    week.end_date.as_deref().unwrap_or_default()
                );
                if label.trim() != filter.trim() {
                    tracing::debug!(week = %label, "week filtered out");
                    continue;
                }
            }

            let Some(start) = parse_dmy(&week.start_date) else {
                tracing::warn!(start_date = %week.start_date, "skipping week with unreadable start date");
                out.skipped += 1;
                continue;
            };
            let end = week.end_date.as_deref().and_then(parse_dmy);

            if let Some(period) = self.period {
                if !week_touches(start, end, period) {
                    tracing::debug!(start_date = %week.start_date, "week outside the requested period");
                    continue;
                }
            }

            for raw_day in week.draw_results_daily {
                walk_day(raw_day, start, end, hour_re.as_ref(), &mut out);
            }
        }

        tracing::debug!(
            candidates = out.candidates.len(),
            skipped = out.skipped,
            "next-data parse finished"
        );
        Ok(out)
    }
}

/// Whether a week starting on `start` has a day in `month` of `year`.
fn week_touches(start: NaiveDate, end: Option<NaiveDate>, (month, year): (u32, i32)) -> bool {
    let end = end
        .or_else(|| start.checked_add_days(Days::new(6)))
        .unwrap_or(start)
        .max(start);
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .any(|d| d.month() == month && d.year() == year)
}

fn walk_day(
    raw_day: Value,
    start: NaiveDate,
    end: Option<NaiveDate>,
    hour_re: Option<&Regex>,
    out: &mut ParseOutput,
) {
    let day: Day = match serde_json::from_value(raw_day) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed day");
            out.skipped += 1;
            return;
        }
    };

    // "dimanche 30/03": the dd/mm token is the last word.
    let token = day.date.split_whitespace().last().unwrap_or_default();
    let Some((day_num, month)) = split_day_month(token) else {
        tracing::warn!(date = %day.date, "skipping day with unreadable date");
        out.skipped += 1;
        return;
    };
    let year = match resolve_month(&month) {
        Some(m) => year_in_week(start, end, m),
        None => start.year(),
    };

    let draws = day
        .draw_results
        .standard_draws
        .into_iter()
        .chain(day.draw_results.night_draws);
    for raw_draw in draws {
        let draw: Draw = match serde_json::from_value(raw_draw) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(date = %day.date, error = %e, "skipping malformed draw");
                out.skipped += 1;
                continue;
            }
        };
        out.candidates.push(RawCandidate {
            date: DateFragment {
                day: day_num,
                month: month.clone(),
                year,
                hour: capture_hour(hour_re, &draw.draw_name),
            },
            name: draw.draw_name,
            number_fragments: vec![draw.winning_numbers],
        });
    }
}

fn extract_payload(html: &str) -> Result<String, StructuralError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#__NEXT_DATA__")
        .map_err(|e| StructuralError::new(STRATEGY, format!("bad selector: {}", e)))?;
    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| StructuralError::new(STRATEGY, "no __NEXT_DATA__ script block"))?;
    let text: String = script.text().collect();
    if text.trim().is_empty() {
        return Err(StructuralError::new(STRATEGY, "__NEXT_DATA__ block is empty"));
    }
    Ok(text)
}
