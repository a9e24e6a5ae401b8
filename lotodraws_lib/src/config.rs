//! Pipeline configuration: rendering endpoint, fetch policy and source profiles.
//!
//! Resolution order is built-in defaults, then an optional TOML file, then
//! environment overrides.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::fetch::FetchPolicy;
use crate::parse::{StrategyKind, DEFAULT_CONTAINER_SELECTOR};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444/wd/hub";
pub const DEFAULT_SOURCE: &str = "lnb-weekly";

/// How one result site is fetched and parsed.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SourceConfig {
    /// Profile name; filled from the table key.
    #[serde(skip)]
    pub name: String,
    pub url: String,
    pub strategy: StrategyKind,
    /// Tried on the same document when `strategy` finds no structure.
    #[serde(default)]
    pub fallback: Option<StrategyKind>,
    /// Element id of the period `<select>`, when the page has one.
    #[serde(default)]
    pub period_control: Option<String>,
    /// Element id of the draw `<select>`, when the page has one.
    #[serde(default)]
    pub draw_control: Option<String>,
    /// Selector of the spinner shown while results load.
    #[serde(default)]
    pub loading_indicator: Option<String>,
    /// Selector whose presence means results are rendered.
    #[serde(default)]
    pub ready_selector: Option<String>,
    /// Results container walked by the dom-tree strategy.
    #[serde(default = "default_container_selector")]
    pub container_selector: String,
    #[serde(default)]
    pub settle_ms: u64,
}

fn default_container_selector() -> String {
    DEFAULT_CONTAINER_SELECTOR.to_string()
}

impl SourceConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Number of selection controls the fetcher will drive for this source.
    pub fn control_count(&self) -> usize {
        usize::from(self.period_control.is_some()) + usize::from(self.draw_control.is_some())
    }
}

/// Everything an extraction run needs besides the query.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub webdriver_url: String,
    pub default_source: String,
    pub fetch: FetchPolicy,
    pub sources: BTreeMap<String, SourceConfig>,
}

/// Shape of the TOML file. Every key is optional; sources merge by name.
#[derive(Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    webdriver_url: Option<String>,
    default_source: Option<String>,
    fetch: Option<FetchPolicy>,
    sources: BTreeMap<String, SourceConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut sources = BTreeMap::new();
        for source in builtin_sources() {
            sources.insert(source.name.clone(), source);
        }
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            default_source: DEFAULT_SOURCE.to_string(),
            fetch: FetchPolicy::default(),
            sources,
        }
    }
}

fn builtin_sources() -> Vec<SourceConfig> {
    let weekly = SourceConfig {
        name: "lnb-weekly".into(),
        url: "https://www.lnbloto.bj/resultats".into(),
        // The results container follows the selectors; the embedded payload
        // only reflects the period the page was first rendered with.
        strategy: StrategyKind::DomTree,
        fallback: Some(StrategyKind::NextData),
        period_control: Some("month".into()),
        draw_control: Some("draw".into()),
        loading_indicator: Some(".loading-indicator".into()),
        ready_selector: Some(DEFAULT_CONTAINER_SELECTOR.into()),
        container_selector: DEFAULT_CONTAINER_SELECTOR.into(),
        settle_ms: 10_000,
    };
    let dom = SourceConfig {
        name: "lnb-dom".into(),
        strategy: StrategyKind::DomTree,
        fallback: None,
        ..weekly.clone()
    };
    let archive = SourceConfig {
        name: "archive".into(),
        url: "https://sites.google.com/view/lotobonheur/archive-benin".into(),
        strategy: StrategyKind::TokenStream,
        fallback: None,
        period_control: None,
        draw_control: None,
        loading_indicator: None,
        ready_selector: Some("p".into()),
        container_selector: DEFAULT_CONTAINER_SELECTOR.into(),
        settle_ms: 1_000,
    };
    vec![weekly, dom, archive]
}

impl PipelineConfig {
    /// Defaults, then the file at `path` (or `LOTODRAWS_CONFIG`), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let env_path = std::env::var("LOTODRAWS_CONFIG").ok();
        let path = path.map(Path::to_path_buf).or_else(|| env_path.map(Into::into));
        if let Some(path) = path {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            config.merge_toml(&text)?;
            tracing::debug!(path = %path.display(), "loaded config file");
        }
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Merge a TOML document over the current values.
    pub fn merge_toml(&mut self, text: &str) -> Result<(), ConfigError> {
        let file: FileConfig = toml::from_str(text)?;
        if let Some(url) = file.webdriver_url {
            self.webdriver_url = url;
        }
        if let Some(name) = file.default_source {
            self.default_source = name;
        }
        if let Some(fetch) = file.fetch {
            self.fetch = fetch;
        }
        for (name, mut source) in file.sources {
            source.name = name.clone();
            self.sources.insert(name, source);
        }
        Ok(())
    }

    /// Apply environment-style overrides read through `lookup`.
    ///
    /// The legacy `BASE_SELENIUM_URL` / `BASE_SCRAPING_URL` names are honoured
    /// when the prefixed ones are unset.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LOTODRAWS_WEBDRIVER_URL").or_else(|| lookup("BASE_SELENIUM_URL")) {
            self.webdriver_url = url;
        }
        if let Some(url) = lookup("LOTODRAWS_BASE_URL").or_else(|| lookup("BASE_SCRAPING_URL")) {
            if let Some(source) = self.sources.get_mut(&self.default_source) {
                source.url = url;
            }
        }
        if let Some(ms) = env_u64(&lookup, "LOTODRAWS_SETTLE_MS") {
            for source in self.sources.values_mut() {
                source.settle_ms = ms;
            }
        }
        if let Some(n) = env_usize(&lookup, "LOTODRAWS_HANDLE_ATTEMPTS") {
            self.fetch.handle_attempts = n;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sources.contains_key(&self.default_source) {
            return Err(ConfigError::UnknownSource(self.default_source.clone()));
        }
        if self.fetch.handle_attempts == 0 || self.fetch.selection_attempts == 0 {
            return Err(ConfigError::Invalid(
                "handle_attempts and selection_attempts must be at least 1".into(),
            ));
        }
        for source in self.sources.values() {
            if source.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("source {} has no url", source.name)));
            }
        }
        Ok(())
    }

    pub fn source(&self, name: &str) -> Result<&SourceConfig, ConfigError> {
        self.sources
            .get(name)
            .ok_or_else(|| ConfigError::UnknownSource(name.to_string()))
    }
}

fn env_u64<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<u64> {
    lookup(key).and_then(|val| val.trim().parse::<u64>().ok())
}

fn env_usize<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<usize> {
    lookup(key).and_then(|val| val.trim().parse::<usize>().ok())
}
