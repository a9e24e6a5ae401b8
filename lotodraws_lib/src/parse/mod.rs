//! Document parser strategies.
//!
//! Each strategy turns a captured document into raw candidates without
//! validating them. Which strategy runs is decided by source configuration;
//! nothing here sniffs the markup to pick one.

mod dom_tree;
mod next_data;
mod token_stream;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;
use scraper::ElementRef;
use serde::Deserialize;

use crate::error::{ConfigError, StructuralError};
use crate::types::{RawCandidate, RawDocument};

pub use self::dom_tree::{DomTreeParser, DEFAULT_CONTAINER_SELECTOR};
pub use self::next_data::NextDataParser;
pub use self::token_stream::{scan_token_groups, token_groups, TokenStreamParser};

/// What a strategy recovered from one document.
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub candidates: Vec<RawCandidate>,
    /// Units (weeks, days, cards, draws, token groups) that were malformed and skipped.
    pub skipped: usize,
}

/// A parsing strategy over rendered result pages.
///
/// Malformed units are skipped and counted; only the absence of any
/// recognizable top-level structure is an error.
pub trait DocumentParser: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn parse(&self, doc: &RawDocument) -> Result<ParseOutput, StructuralError>;
}

/// The available strategies, as named in configuration.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Embedded `__NEXT_DATA__` JSON payload.
    NextData,
    /// Week / day / draw-card block tree.
    DomTree,
    /// Flat paragraph token scan with a date cursor.
    TokenStream,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::NextData => "next-data",
            StrategyKind::DomTree => "dom-tree",
            StrategyKind::TokenStream => "token-stream",
        }
    }

    /// Instantiate the strategy with the knobs it reads from `options`.
    pub fn build(&self, options: &ParserOptions) -> Box<dyn DocumentParser> {
        match self {
            StrategyKind::NextData => Box::new(NextDataParser {
                week_filter: options.week_filter.clone(),
                period: options.period,
            }),
            StrategyKind::DomTree => Box::new(DomTreeParser {
                container_selector: options.container_selector.clone(),
            }),
            StrategyKind::TokenStream => Box::new(TokenStreamParser {
                today: options.today,
            }),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next-data" => Ok(StrategyKind::NextData),
            "dom-tree" => Ok(StrategyKind::DomTree),
            "token-stream" => Ok(StrategyKind::TokenStream),
            other => Err(ConfigError::Invalid(format!(
                "unknown strategy '{}'. Valid: next-data, dom-tree, token-stream",
                other
            ))),
        }
    }
}

/// Per-source knobs the strategies need.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// CSS selector of the block holding the week blocks (dom-tree).
    pub container_selector: String,
    /// Restrict the payload walk to one `"dd/mm/yyyy - dd/mm/yyyy"` week (next-data).
    pub week_filter: Option<String>,
    /// Month and year the fetch selected; weeks outside it are left out (next-data).
    pub period: Option<(u32, i32)>,
    /// Starting point of the date cursor (token-stream).
    pub today: NaiveDate,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            container_selector: DEFAULT_CONTAINER_SELECTOR.to_string(),
            week_filter: None,
            period: None,
            today: chrono::Local::now().date_naive(),
        }
    }
}

/// Whitespace-normalized text content of an element.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pattern for the hour in weekly draw names ("Star 14H", "Digital 00H").
pub(crate) fn name_hour_pattern() -> Option<Regex> {
    Regex::new(r"(?i)\b(\d{1,2})\s*h\b").ok()
}

/// First capture group of `re` in `text`, as an hour.
pub(crate) fn capture_hour(re: Option<&Regex>, text: &str) -> Option<u32> {
    re?.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Year for a `dd/mm` day inside a week that starts on `start` and may end on `end`.
///
/// Weeks straddling New Year print "30/12/2024 au 05/01/2025"; days whose
/// month precedes the start month belong to the end date's year.
pub(crate) fn year_in_week(start: NaiveDate, end: Option<NaiveDate>, month: u32) -> i32 {
    use chrono::Datelike;
    match end {
        Some(end) if end.year() > start.year() && month < start.month() => end.year(),
        _ => start.year(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_roundtrip() {
        for kind in [
            StrategyKind::NextData,
            StrategyKind::DomTree,
            StrategyKind::TokenStream,
        ] {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
            assert_eq!(kind.build(&ParserOptions::default()).kind(), kind);
        }
        assert!("auto".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn year_rolls_over_inside_new_year_week() {
        let start = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 5);
        assert_eq!(year_in_week(start, end, 12), 2024);
        assert_eq!(year_in_week(start, end, 1), 2025);
        assert_eq!(year_in_week(start, None, 1), 2024);
    }

    #[test]
    fn hour_comes_from_draw_name() {
        let re = name_hour_pattern();
        assert_eq!(capture_hour(re.as_ref(), "Star 14H"), Some(14));
        assert_eq!(capture_hour(re.as_ref(), "Digital 00H"), Some(0));
        assert_eq!(capture_hour(re.as_ref(), "FORTUNE 11 h"), Some(11));
        assert_eq!(capture_hour(re.as_ref(), "Lotto Kadoo"), None);
        assert_eq!(capture_hour(re.as_ref(), "Star 14Hx"), None);
    }
}
