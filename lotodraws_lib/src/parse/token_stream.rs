//! Flat paragraph scan for the archive layout.
//!
//! Archive pages are a long run of `<p>` elements, each made of `<span>`s.
//! Two span patterns matter:
//!
//! ```text
//! ["ii", "Dimanche 30", "mars 2025", "ii"]                   date marker
//! ["j", "DIGITAL 1 Tirage 00H", "10 - 60 - 13 - 31 - 87"]    draw result
//! ```
//!
//! Draw results belong to the most recent date marker. Markers without a
//! usable date step a cursor back one day from the current date.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use scraper::{Html, Selector};

use super::{capture_hour, element_text, DocumentParser, ParseOutput, StrategyKind};
use crate::classify::classify;
use crate::date::{normalize, resolve_month};
use crate::error::StructuralError;
use crate::numbers::is_placeholder;
use crate::types::{DateFragment, RawCandidate, RawDocument};

const STRATEGY: &str = "token-stream";

const MARKER_SENTINEL: &str = "ii";
const RESULT_SENTINEL: &str = "j";
/// Sentinel, label and at least one numbers fragment.
const MIN_RESULT_LEN: usize = 3;

/// Scans paragraph token groups with a date cursor.
#[derive(Debug, Clone)]
pub struct TokenStreamParser {
    /// Where the cursor starts when markers carry no usable date.
    pub today: NaiveDate,
}

impl DocumentParser for TokenStreamParser {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TokenStream
    }

    fn parse(&self, doc: &RawDocument) -> Result<ParseOutput, StructuralError> {
        let groups = token_groups(&doc.html)?;
        Ok(scan_token_groups(&groups, self.today))
    }
}

/// One group per `<p>`: the trimmed text of each of its `<span>`s.
pub fn token_groups(html: &str) -> Result<Vec<Vec<String>>, StructuralError> {
    let document = Html::parse_document(html);
    let p = Selector::parse("p")
        .map_err(|e| StructuralError::new(STRATEGY, format!("bad selector: {}", e)))?;
    let span = Selector::parse("span")
        .map_err(|e| StructuralError::new(STRATEGY, format!("bad selector: {}", e)))?;

    Ok(document
        .select(&p)
        .map(|para| para.select(&span).map(element_text).collect::<Vec<_>>())
        .filter(|group| !group.is_empty())
        .collect())
}

/// Date state threaded through one scan.
struct ScanCursor {
    today: NaiveDate,
    current: Option<NaiveDate>,
}

impl ScanCursor {
    fn new(today: NaiveDate) -> Self {
        Self {
            today,
            current: None,
        }
    }

    fn set(&mut self, date: NaiveDate) {
        self.current = Some(date);
    }

    fn step_back(&mut self) -> NaiveDate {
        let base = self.current.unwrap_or(self.today);
        let prev = base.pred_opt().unwrap_or(base);
        self.current = Some(prev);
        prev
    }
}

/// What a marker's inner elements said about the date.
#[derive(Debug, Default)]
struct MarkerDate {
    day: Option<u32>,
    month: Option<u32>,
    month_text: Option<String>,
    year: Option<i32>,
}

/// Run the marker / result state machine over token groups.
///
/// Never fails: malformed result groups are skipped and counted.
pub fn scan_token_groups(groups: &[Vec<String>], today: NaiveDate) -> ParseOutput {
    let hour_re = Regex::new(r"(?i)tirage\s*(\d{1,2})\s*h").ok();
    let mut cursor = ScanCursor::new(today);
    let mut out = ParseOutput::default();

    for group in groups {
        if is_marker(group) {
            apply_marker(&group[1..group.len() - 1], &mut cursor);
            continue;
        }
        if group.first().map(String::as_str) != Some(RESULT_SENTINEL) {
            continue;
        }
        if group.len() < MIN_RESULT_LEN {
            tracing::debug!(?group, "result group too short");
            out.skipped += 1;
            continue;
        }
        let Some(date) = cursor.current else {
            tracing::warn!(label = %group[1], "result before any date marker, skipped");
            out.skipped += 1;
            continue;
        };

        let label = &group[1];
        if classify(label).is_none() {
            tracing::debug!(label = %label, "unrecognized draw label, skipped");
            out.skipped += 1;
            continue;
        }
        let hour = capture_hour(hour_re.as_ref(), label);
        let number_fragments: Vec<String> = group[2..]
            .iter()
            .filter(|item| item.contains('-') && !is_placeholder(item))
            .cloned()
            .collect();

        out.candidates.push(RawCandidate {
            date: DateFragment {
                day: date.day(),
                month: date.month().to_string(),
                year: date.year(),
                hour,
            },
            name: label.clone(),
            number_fragments,
        });
    }

    tracing::debug!(
        candidates = out.candidates.len(),
        skipped = out.skipped,
        "token-stream scan finished"
    );
    out
}

fn is_marker(group: &[String]) -> bool {
    group.len() >= 2
        && group.first().map(String::as_str) == Some(MARKER_SENTINEL)
        && group.last().map(String::as_str) == Some(MARKER_SENTINEL)
}

fn read_marker(inner: &[String]) -> MarkerDate {
    let mut parsed = MarkerDate::default();
    // "Dimanche 30": the day is the first run of digits.
    if let Some(first) = inner.first() {
        parsed.day = first
            .split(|c: char| !c.is_ascii_digit())
            .find(|s| !s.is_empty())
            .and_then(|s| s.parse().ok());
    }
    // "mars 2025"
    if let Some(second) = inner.get(1) {
        let mut words = second.split_whitespace();
        if let Some(month) = words.next() {
            parsed.month = resolve_month(month);
            parsed.month_text = Some(month.to_string());
        }
        parsed.year = words
            .find(|w| w.len() == 4 && w.chars().all(|c| c.is_ascii_digit()))
            .and_then(|w| w.parse().ok());
    }
    parsed
}

fn apply_marker(inner: &[String], cursor: &mut ScanCursor) {
    let marker = read_marker(inner);
    if let (Some(day), Some(month_text), Some(year)) =
        (marker.day, marker.month_text.as_deref(), marker.year)
    {
        match normalize(day, month_text, year) {
            Ok(date) => {
                cursor.set(date);
                return;
            }
            Err(e) => tracing::debug!(error = %e, "marker date unusable, stepping cursor"),
        }
    }

    let stepped = cursor.step_back();
    let day_mismatch = marker.day.is_some_and(|d| d != stepped.day());
    let month_mismatch = marker.month.is_some_and(|m| m != stepped.month());
    if day_mismatch || month_mismatch {
        tracing::warn!(
            marker = ?inner,
            cursor = %stepped,
            "marker text disagrees with cursor, keeping cursor"
        );
    }
}
