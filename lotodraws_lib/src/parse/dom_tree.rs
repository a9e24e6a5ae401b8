//! Week / day / draw-card tree strategy.
//!
//! Layout of the rendered weekly page below the results container:
//!
//! ```text
//! container
//!   div                      (toolbar, ignored)
//!   div  week                h4 "Semaine du 28/10/2024 au 03/11/2024"
//!     div  day               h5 "Jeudi 31/10"
//!       div.rounded-md card  div.font-bold "Star 14H", p "10", p "60", ...
//! ```

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{
    capture_hour, element_text, name_hour_pattern, year_in_week, DocumentParser, ParseOutput,
    StrategyKind,
};
use crate::date::{parse_dmy, resolve_month, split_day_month};
use crate::error::StructuralError;
use crate::types::{DateFragment, RawCandidate, RawDocument};

const STRATEGY: &str = "dom-tree";

pub const DEFAULT_CONTAINER_SELECTOR: &str = "#__next > main > div > div > div > div";

struct Selectors {
    week_range: Regex,
    hour: Option<Regex>,
    week_header: Selector,
    day_header: Selector,
    card: Selector,
    name: Selector,
    number: Selector,
}

impl Selectors {
    fn new() -> Result<Self, StructuralError> {
        let parse = |css: &str| {
            Selector::parse(css)
                .map_err(|e| StructuralError::new(STRATEGY, format!("bad selector {}: {}", css, e)))
        };
        let week_range =
            Regex::new(r"du\s+(\d{1,2}/\d{1,2}/\d{4})(?:\s+au\s+(\d{1,2}/\d{1,2}/\d{4}))?")
                .map_err(|e| StructuralError::new(STRATEGY, format!("bad week pattern: {}", e)))?;
        Ok(Self {
            week_range,
            hour: name_hour_pattern(),
            week_header: parse("h4")?,
            day_header: parse("h5")?,
            card: parse(r#"div[class*="rounded-md"]"#)?,
            name: parse(r#"div[class*="font-bold"]"#)?,
            number: parse("p")?,
        })
    }
}

/// Walks week blocks under a results container.
#[derive(Debug, Clone)]
pub struct DomTreeParser {
    pub container_selector: String,
}

impl Default for DomTreeParser {
    fn default() -> Self {
        Self {
            container_selector: DEFAULT_CONTAINER_SELECTOR.to_string(),
        }
    }
}

impl DocumentParser for DomTreeParser {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DomTree
    }

    fn parse(&self, doc: &RawDocument) -> Result<ParseOutput, StructuralError> {
        let document = Html::parse_document(&doc.html);
        let container_sel = Selector::parse(&self.container_selector).map_err(|e| {
            StructuralError::new(
                STRATEGY,
                format!("bad container selector {}: {}", self.container_selector, e),
            )
        })?;
        let container = document.select(&container_sel).next().ok_or_else(|| {
            StructuralError::new(
                STRATEGY,
                format!("results container {} not found", self.container_selector),
            )
        })?;
        let sel = Selectors::new()?;

        let mut out = ParseOutput::default();
        for week in child_divs(container).skip(1) {
            let Some((start, end)) = week_range(week, &sel) else {
                tracing::debug!("skipping week block without a readable header");
                out.skipped += 1;
                continue;
            };
            for day in child_divs(week) {
                walk_day(day, start, end, &sel, &mut out);
            }
        }

        tracing::debug!(
            candidates = out.candidates.len(),
            skipped = out.skipped,
            "dom-tree parse finished"
        );
        Ok(out)
    }
}

fn child_divs<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "div")
}

fn week_range(week: ElementRef<'_>, sel: &Selectors) -> Option<(NaiveDate, Option<NaiveDate>)> {
    let header = element_text(week.select(&sel.week_header).next()?);
    let caps = sel.week_range.captures(&header)?;
    let start = parse_dmy(caps.get(1)?.as_str())?;
    let end = caps.get(2).and_then(|m| parse_dmy(m.as_str()));
    Some((start, end))
}

fn walk_day(
    day: ElementRef<'_>,
    start: NaiveDate,
    end: Option<NaiveDate>,
    sel: &Selectors,
    out: &mut ParseOutput,
) {
    // Week blocks also hold their own header wrapper; only blocks with an h5 are days.
    let Some(header) = day.select(&sel.day_header).next() else {
        return;
    };
    let header = element_text(header);
    let parsed = header
        .split_whitespace()
        .last()
        .and_then(split_day_month);
    let Some((day_num, month)) = parsed else {
        tracing::warn!(header = %header, "skipping day with unreadable header");
        out.skipped += 1;
        return;
    };
    let year = match resolve_month(&month) {
        Some(m) => year_in_week(start, end, m),
        None => start.year(),
    };

    for card in day.select(&sel.card) {
        let Some(name) = card.select(&sel.name).next().map(element_text) else {
            tracing::debug!(day = %header, "skipping card without a name");
            out.skipped += 1;
            continue;
        };
        let number_fragments: Vec<String> = card
            .select(&sel.number)
            .map(element_text)
            .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
            .collect();
        out.candidates.push(RawCandidate {
            date: DateFragment {
                day: day_num,
                month: month.clone(),
                year,
                hour: capture_hour(sel.hour.as_ref(), &name),
            },
            name,
            number_fragments,
        });
    }
}
