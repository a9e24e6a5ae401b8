//! Library layer for lotodraws: fetch rendered result pages and turn them
//! into validated draw records.
//!
//! Drives a WebDriver browser through `lotodraws_render`, parses the captured
//! markup with one of three configured strategies, and assembles
//! deduplicated [`DrawResult`]s.

pub mod assemble;
pub mod classify;
pub mod config;
pub mod date;
pub mod error;
pub mod fetch;
pub mod numbers;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod retry;
pub mod types;

pub use lotodraws_render;

pub use assemble::{assemble, Assembly};
pub use classify::classify;
pub use config::{PipelineConfig, SourceConfig};
pub use date::{normalize, parse_period, previous_period};
pub use error::{ConfigError, DateError, FetchError, PipelineError, StructuralError};
pub use fetch::{FetchPolicy, FetchQuery, Fetcher};
pub use numbers::extract_numbers;
pub use parse::{DocumentParser, ParseOutput, ParserOptions, StrategyKind};
pub use pipeline::{Extraction, Pipeline};
pub use render::{RenderBackend, RenderError, RenderSession, WebDriverBackend};
pub use types::{DateFragment, DrawResult, GameType, RawCandidate, RawDocument};
