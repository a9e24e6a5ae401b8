//! Fetch, parse, assemble.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::instrument;

use crate::assemble::assemble;
use crate::config::{PipelineConfig, SourceConfig};
use crate::date::parse_period;
use crate::error::{FetchError, PipelineError};
use crate::fetch::{FetchPolicy, FetchQuery, Fetcher};
use crate::parse::{ParserOptions, StrategyKind};
use crate::render::{RenderBackend, WebDriverBackend};
use crate::types::{DrawResult, RawDocument};

/// Result of one extraction run.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub source: String,
    /// Strategy that produced the candidates (the fallback, if it was used).
    pub strategy: StrategyKind,
    pub records: Vec<DrawResult>,
    pub candidates: usize,
    pub skipped: usize,
    pub dropped: usize,
    pub duplicates: usize,
}

/// One configured source, wired to a rendering backend.
pub struct Pipeline {
    source: SourceConfig,
    fetcher: Fetcher,
    today: Option<NaiveDate>,
    week_filter: Option<String>,
}

impl Pipeline {
    /// Pipeline for `source` talking to the configured WebDriver endpoint.
    pub fn new(config: &PipelineConfig, source: &str) -> Result<Self, PipelineError> {
        let profile = config.source(source)?.clone();
        let backend = WebDriverBackend::new(&config.webdriver_url).map_err(|e| {
            FetchError::Backend(format!(
                "bad webdriver endpoint {}: {}",
                config.webdriver_url, e
            ))
        })?;
        Ok(Self::with_backend(
            profile,
            config.fetch.clone(),
            Arc::new(backend),
        ))
    }

    /// Pipeline over an arbitrary rendering backend.
    pub fn with_backend(
        source: SourceConfig,
        policy: FetchPolicy,
        backend: Arc<dyn RenderBackend>,
    ) -> Self {
        Self {
            source,
            fetcher: Fetcher::new(backend, policy),
            today: None,
            week_filter: None,
        }
    }

    /// Parse with `kind` only, ignoring the source's strategy and fallback.
    pub fn with_strategy(mut self, kind: StrategyKind) -> Self {
        self.source.strategy = kind;
        self.source.fallback = None;
        self
    }

    /// Fix the token-stream cursor origin instead of using the local date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_week_filter(mut self, week: Option<String>) -> Self {
        self.week_filter = week;
        self
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Fetch the period (and optional draw) and return validated records.
    ///
    /// Zero records is a successful run. Fetch failures and documents no
    /// strategy can make sense of are errors.
    #[instrument(skip(self), fields(source = %self.source.name))]
    pub async fn run_extraction(
        &self,
        period: &str,
        draw_filter: Option<&str>,
        wait_budget: Duration,
    ) -> Result<Extraction, PipelineError> {
        let query = FetchQuery {
            period: period.to_string(),
            draw_filter: draw_filter.map(String::from),
            wait_budget,
        };
        let doc = match self.fetcher.fetch(&self.source, &query).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(kind = e.kind(), "fetch failed: {}", e);
                return Err(e.into());
            }
        };
        let selected = match parse_period(period) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!("not restricting parse to the period: {}", e);
                None
            }
        };
        self.extract(&doc, selected)
    }

    /// Parse and assemble an already captured document.
    pub fn extract_document(&self, doc: &RawDocument) -> Result<Extraction, PipelineError> {
        self.extract(doc, None)
    }

    fn extract(
        &self,
        doc: &RawDocument,
        period: Option<(u32, i32)>,
    ) -> Result<Extraction, PipelineError> {
        let options = self.parser_options(period);
        let primary = self.source.strategy.build(&options);

        let (strategy, output) = match primary.parse(doc) {
            Ok(output) => (primary.kind(), output),
            Err(err) => match self.source.fallback {
                Some(fallback) => {
                    tracing::warn!(
                        primary = %self.source.strategy,
                        fallback = %fallback,
                        "primary strategy failed ({}), trying fallback",
                        err.reason
                    );
                    (fallback, fallback.build(&options).parse(doc)?)
                }
                None => return Err(err.into()),
            },
        };

        let candidates = output.candidates.len();
        let skipped = output.skipped;
        let assembly = assemble(output.candidates);
        tracing::info!(
            source = %self.source.name,
            strategy = %strategy,
            records = assembly.records.len(),
            candidates,
            skipped,
            dropped = assembly.dropped,
            duplicates = assembly.duplicates,
            "extraction finished"
        );

        Ok(Extraction {
            source: self.source.name.clone(),
            strategy,
            records: assembly.records,
            candidates,
            skipped,
            dropped: assembly.dropped,
            duplicates: assembly.duplicates,
        })
    }

    fn parser_options(&self, period: Option<(u32, i32)>) -> ParserOptions {
        ParserOptions {
            container_selector: self.source.container_selector.clone(),
            week_filter: self.week_filter.clone(),
            period,
            today: self
                .today
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
        }
    }
}
