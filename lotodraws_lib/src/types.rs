//! Records flowing through the pipeline.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of draw products the pipeline emits records for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameType {
    // Archive page labels.
    #[serde(rename = "DIGITAL_1")]
    Digital1,
    #[serde(rename = "DIGITAL_2")]
    Digital2,
    #[serde(rename = "RESULT_1")]
    Result1,
    #[serde(rename = "RESULT_2")]
    Result2,
    #[serde(rename = "RESULT_3")]
    Result3,
    // Weekly results page names.
    #[serde(rename = "DIGITAL_00H")]
    Digital00H,
    #[serde(rename = "DIGITAL_21H")]
    Digital21H,
    #[serde(rename = "STAR_11H")]
    Star11H,
    #[serde(rename = "STAR_14H")]
    Star14H,
    #[serde(rename = "STAR_18H")]
    Star18H,
    #[serde(rename = "FORTUNE_11H")]
    Fortune11H,
    #[serde(rename = "FORTUNE_14H")]
    Fortune14H,
    #[serde(rename = "FORTUNE_18H")]
    Fortune18H,
}

impl GameType {
    pub fn code(&self) -> &'static str {
        match self {
            GameType::Digital1 => "DIGITAL_1",
            GameType::Digital2 => "DIGITAL_2",
            GameType::Result1 => "RESULT_1",
            GameType::Result2 => "RESULT_2",
            GameType::Result3 => "RESULT_3",
            GameType::Digital00H => "DIGITAL_00H",
            GameType::Digital21H => "DIGITAL_21H",
            GameType::Star11H => "STAR_11H",
            GameType::Star14H => "STAR_14H",
            GameType::Star18H => "STAR_18H",
            GameType::Fortune11H => "FORTUNE_11H",
            GameType::Fortune14H => "FORTUNE_14H",
            GameType::Fortune18H => "FORTUNE_18H",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validated draw result, the only thing that leaves the pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DrawResult {
    pub draw_date_time: NaiveDateTime,
    /// Never empty.
    pub numbers: Vec<u32>,
    pub bonus: Option<u32>,
    pub game_type: GameType,
}

impl DrawResult {
    /// Natural key used for deduplication and by downstream upserts.
    pub fn key(&self) -> (NaiveDateTime, GameType) {
        (self.draw_date_time, self.game_type)
    }
}

/// Date parts a strategy has already pulled out of the markup.
///
/// Year inference has been done by the strategy; the month is still text and
/// is resolved by [`crate::date::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFragment {
    pub day: u32,
    pub month: String,
    pub year: i32,
    pub hour: Option<u32>,
}

/// An unvalidated draw tuple as produced by a parser strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub date: DateFragment,
    pub name: String,
    pub number_fragments: Vec<String>,
}

/// Rendered markup captured by the fetcher.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Name of the source profile the document was captured from.
    pub source: String,
    pub url: String,
    pub html: String,
    pub captured_at: DateTime<Utc>,
}

impl RawDocument {
    /// Wraps markup that did not come from a live fetch (saved pages, fixtures).
    pub fn from_html(source: &str, html: impl Into<String>) -> Self {
        Self {
            source: source.to_string(),
            url: String::new(),
            html: html.into(),
            captured_at: Utc::now(),
        }
    }
}
