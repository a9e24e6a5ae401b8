//! Rendered-document fetcher.
//!
//! One fetch owns one rendering session: open, navigate, drive the period and
//! draw selectors, wait for the results to render, capture the markup, close.
//! The session is closed on every exit path, including a timeout or a panic
//! in the driving code.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use lotodraws_render::{ElementRef, Locator};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::instrument;

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::render::{RenderBackend, RenderError, RenderSession};
use crate::retry::retry;
use crate::types::RawDocument;

const READY_SCRIPT: &str = r#"
const indicator = arguments[0];
return document.readyState === "complete"
    && !(indicator && document.querySelector(indicator));
"#;

// React-controlled selects ignore a plain `.value =`; go through the native setter.
const SELECT_SCRIPT: &str = r#"
const select = arguments[0];
const wanted = String(arguments[1]).trim();
const option = Array.from(select.options).find(o => o.text.trim() === wanted);
if (!option) { return false; }
const setter = Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, "value").set;
setter.call(select, option.value);
select.dispatchEvent(new Event("input", { bubbles: true }));
select.dispatchEvent(new Event("change", { bubbles: true }));
return true;
"#;

/// Retry and wait knobs shared by every source.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FetchPolicy {
    /// Attempts to resolve a DOM handle before giving up.
    pub handle_attempts: usize,
    pub handle_delay_ms: u64,
    /// Attempts to make a selector show the requested option.
    pub selection_attempts: usize,
    /// Interval between ready-signal polls.
    pub poll_interval_ms: u64,
    /// Allowance for session setup and navigation inside the invocation ceiling.
    pub navigation_timeout_ms: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            handle_attempts: 5,
            handle_delay_ms: 1_000,
            selection_attempts: 3,
            poll_interval_ms: 500,
            navigation_timeout_ms: 60_000,
        }
    }
}

impl FetchPolicy {
    pub fn handle_delay(&self) -> Duration {
        Duration::from_millis(self.handle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Worst-case time spent in handle retries and selection re-tries.
    fn retry_allowance(&self, controls: usize) -> Duration {
        let per_handle = self
            .handle_delay()
            .saturating_mul(saturating_u32(self.handle_attempts));
        // Each selection attempt resolves the control and its checked option.
        let per_selection = per_handle
            .saturating_mul(2)
            .saturating_add(self.poll_interval());
        let selections = saturating_u32(self.selection_attempts.saturating_mul(controls));
        // Plus one retry loop for the final capture.
        per_selection
            .saturating_mul(selections)
            .saturating_add(per_handle)
    }
}

/// What to fetch.
#[derive(Debug, Clone)]
pub struct FetchQuery {
    /// Period label as the source's selector shows it ("mars 2025"). Passed through unvalidated.
    pub period: String,
    /// Optional draw selector value.
    pub draw_filter: Option<String>,
    /// Total time allowed for ready signals to appear.
    pub wait_budget: Duration,
}

/// Drives a rendering backend to capture one document per call.
#[derive(Clone)]
pub struct Fetcher {
    backend: Arc<dyn RenderBackend>,
    policy: FetchPolicy,
}

impl Fetcher {
    pub fn new(backend: Arc<dyn RenderBackend>, policy: FetchPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Hard ceiling for one fetch: navigation, wait budget, settle and retries.
    pub fn ceiling(&self, source: &SourceConfig, query: &FetchQuery) -> Duration {
        Duration::from_millis(self.policy.navigation_timeout_ms)
            .saturating_add(query.wait_budget)
            .saturating_add(source.settle_delay())
            .saturating_add(self.policy.retry_allowance(source.control_count()))
    }

    #[instrument(skip_all, fields(source = %source.name, period = %query.period))]
    pub async fn fetch(
        &self,
        source: &SourceConfig,
        query: &FetchQuery,
    ) -> Result<RawDocument, FetchError> {
        let ceiling = self.ceiling(source, query);

        // Opening the session counts against the ceiling too; whatever got
        // opened is closed after the timed region ends, however it ends.
        let mut opened: Option<Box<dyn RenderSession>> = None;
        let run = AssertUnwindSafe(async {
            let session = match self.backend.open_session().await {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!("failed to open rendering session: {}", e);
                    return Err(FetchError::Network(format!(
                        "could not open rendering session: {}",
                        e
                    )));
                }
            };
            let session: &dyn RenderSession = &**opened.insert(session);
            self.drive(session, source, query).await
        })
        .catch_unwind();
        let outcome = tokio::time::timeout(ceiling, run).await;

        if let Some(session) = opened.take() {
            if let Err(e) = session.close().await {
                tracing::warn!("failed to close rendering session: {}", e);
            }
        }

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("fetch panicked: {}", message);
                Err(FetchError::Backend(format!("fetch panicked: {}", message)))
            }
            Err(_) => {
                tracing::error!(ceiling = ?ceiling, "fetch hit its ceiling");
                Err(FetchError::Timeout {
                    what: "fetch to complete".into(),
                    waited: ceiling,
                })
            }
        }
    }

    async fn drive(
        &self,
        session: &dyn RenderSession,
        source: &SourceConfig,
        query: &FetchQuery,
    ) -> Result<RawDocument, FetchError> {
        // No deadline when the budget reaches past what the clock can represent.
        let deadline = Instant::now().checked_add(query.wait_budget);

        session.navigate(&source.url).await.map_err(|e| {
            tracing::error!(url = %source.url, "navigation failed: {}", e);
            FetchError::Network(format!("navigation to {} failed: {}", source.url, e))
        })?;
        tracing::debug!(url = %source.url, "navigated");
        self.wait_ready(session, source, deadline).await?;

        let mut selected = false;
        if let Some(control) = &source.period_control {
            self.select(session, control, &query.period).await?;
            selected = true;
        }
        if let (Some(control), Some(draw)) = (&source.draw_control, &query.draw_filter) {
            self.select(session, control, draw).await?;
            selected = true;
        }
        if selected {
            self.wait_ready(session, source, deadline).await?;
        }
        if let Some(selector) = &source.ready_selector {
            self.wait_present(session, selector, deadline).await?;
        }

        if !source.settle_delay().is_zero() {
            tracing::debug!(settle = ?source.settle_delay(), "letting the page settle");
            tokio::time::sleep(source.settle_delay()).await;
        }

        let html = retry(
            self.policy.handle_attempts,
            self.policy.handle_delay(),
            "page source",
            |e: &RenderError| e.is_stale() || e.is_no_such_element(),
            move || async move { session.page_source().await },
        )
        .await
        .map_err(|e| render_failure(e, "page source", self.policy.handle_attempts))?;
        tracing::info!(bytes = html.len(), "captured document");

        Ok(RawDocument {
            source: source.name.clone(),
            url: source.url.clone(),
            html,
            captured_at: Utc::now(),
        })
    }

    /// Poll until the document is complete and no loading indicator is shown.
    async fn wait_ready(
        &self,
        session: &dyn RenderSession,
        source: &SourceConfig,
        deadline: Option<Instant>,
    ) -> Result<(), FetchError> {
        let started = Instant::now();
        let indicator = source
            .loading_indicator
            .as_deref()
            .map_or(Value::Null, |s| json!(s));
        loop {
            match session.execute(READY_SCRIPT, vec![indicator.clone()]).await {
                Ok(Value::Bool(true)) => return Ok(()),
                Ok(_) => {}
                Err(e) if e.is_transport() => {
                    return Err(FetchError::Network(format!("ready check failed: {}", e)))
                }
                Err(e) => tracing::debug!("ready check errored, polling again: {}", e),
            }
            if passed(deadline) {
                return Err(FetchError::Timeout {
                    what: "document ready".into(),
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(self.policy.poll_interval()).await;
        }
    }

    /// Poll until `selector` matches an element.
    async fn wait_present(
        &self,
        session: &dyn RenderSession,
        selector: &str,
        deadline: Option<Instant>,
    ) -> Result<(), FetchError> {
        let started = Instant::now();
        let locator = Locator::css(selector);
        loop {
            match session.find_element(&locator).await {
                Ok(_) => return Ok(()),
                Err(e) if e.is_no_such_element() || e.is_stale() => {}
                Err(e) => return Err(render_failure(e, selector, 1)),
            }
            if passed(deadline) {
                return Err(FetchError::Timeout {
                    what: format!("{} to appear", selector),
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(self.policy.poll_interval()).await;
        }
    }

    /// Choose `requested` in the `<select id=control>` and confirm the page shows it.
    async fn select(
        &self,
        session: &dyn RenderSession,
        control: &str,
        requested: &str,
    ) -> Result<(), FetchError> {
        let control_locator = Locator::id(control);
        let checked_locator = Locator::css(&format!("#{} option:checked", control));
        let mut observed = None;

        for attempt in 1..=self.policy.selection_attempts {
            let found = self
                .with_element(session, &control_locator, move |el| async move {
                    session
                        .execute(SELECT_SCRIPT, vec![el.to_value(), json!(requested)])
                        .await
                })
                .await?;
            if found != Value::Bool(true) {
                tracing::warn!(control, requested, "no option with that text");
            }

            observed = self
                .with_element(session, &checked_locator, move |el| async move {
                    session.element_property(&el, "text").await
                })
                .await?;
            if observed.as_deref().map(str::trim) == Some(requested.trim()) {
                tracing::debug!(control, requested, attempt, "selection confirmed");
                return Ok(());
            }
            tracing::warn!(
                control,
                requested,
                observed = ?observed,
                attempt,
                "selection not reflected"
            );
            tokio::time::sleep(self.policy.poll_interval()).await;
        }

        Err(FetchError::SelectionMismatch {
            control: control.to_string(),
            requested: requested.to_string(),
            observed,
            attempts: self.policy.selection_attempts,
        })
    }

    /// Resolve `locator` afresh and run `op` on it, retrying stale or missing handles.
    async fn with_element<T, F, Fut>(
        &self,
        session: &dyn RenderSession,
        locator: &Locator,
        op: F,
    ) -> Result<T, FetchError>
    where
        F: Fn(ElementRef) -> Fut,
        Fut: std::future::Future<Output = Result<T, RenderError>>,
    {
        let label = locator.to_string();
        let op = &op;
        retry(
            self.policy.handle_attempts,
            self.policy.handle_delay(),
            &label,
            |e: &RenderError| e.is_stale() || e.is_no_such_element(),
            move || async move {
                let el = session.find_element(locator).await?;
                op(el).await
            },
        )
        .await
        .map_err(|e| render_failure(e, &label, self.policy.handle_attempts))
    }
}

fn passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn render_failure(err: RenderError, what: &str, attempts: usize) -> FetchError {
    if err.is_stale() || err.is_no_such_element() {
        FetchError::StaleHandle {
            locator: what.to_string(),
            attempts,
        }
    } else if err.is_transport() {
        FetchError::Network(format!("{}: {}", what, err))
    } else {
        FetchError::Backend(format!("{}: {}", what, err))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lotodraws_render::ErrorKind;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn wire(kind: ErrorKind) -> RenderError {
        RenderError::WebDriver {
            kind,
            message: "scripted".into(),
        }
    }

    #[derive(Default)]
    struct Script {
        /// Ready checks that report "not yet" before reporting complete.
        not_ready_polls: usize,
        never_ready: bool,
        /// find_element calls that fail stale before succeeding.
        stale_finds: usize,
        /// Option text the page reports regardless of what was selected.
        stuck_on: Option<String>,
        /// Ready selector is never present.
        absent: bool,
        /// page_source calls that fail stale before succeeding.
        stale_sources: usize,
        hang_on_navigate: bool,
        panic_on_source: bool,
        fail_open: bool,
        hang_on_open: bool,
    }

    #[derive(Default)]
    struct State {
        ready_polls: AtomicUsize,
        finds: AtomicUsize,
        sources: AtomicUsize,
        selected: Mutex<Option<String>>,
        selections: Mutex<Vec<String>>,
        closed: AtomicBool,
        sessions: AtomicUsize,
    }

    struct FakeBackend {
        script: Arc<Script>,
        state: Arc<State>,
    }

    struct FakeSession {
        script: Arc<Script>,
        state: Arc<State>,
    }

    fn fake(script: Script) -> (Arc<FakeBackend>, Arc<State>) {
        let state = Arc::new(State::default());
        let backend = Arc::new(FakeBackend {
            script: Arc::new(script),
            state: Arc::clone(&state),
        });
        (backend, state)
    }

    #[async_trait]
    impl RenderBackend for FakeBackend {
        async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError> {
            if self.script.fail_open {
                return Err(RenderError::RequestFailed);
            }
            if self.script.hang_on_open {
                std::future::pending::<()>().await;
            }
            self.state.sessions.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                script: Arc::clone(&self.script),
                state: Arc::clone(&self.state),
            }))
        }
    }

    #[async_trait]
    impl RenderSession for FakeSession {
        async fn navigate(&self, _url: &str) -> Result<(), RenderError> {
            if self.script.hang_on_navigate {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, RenderError> {
            if script.contains("readyState") {
                let n = self.state.ready_polls.fetch_add(1, Ordering::SeqCst);
                let ready = !self.script.never_ready && n >= self.script.not_ready_polls;
                return Ok(Value::Bool(ready));
            }
            if script.contains("dispatchEvent") {
                let wanted = args.get(1).and_then(Value::as_str).unwrap_or_default();
                self.state.selections.lock().unwrap().push(wanted.to_string());
                *self.state.selected.lock().unwrap() = Some(wanted.to_string());
                return Ok(Value::Bool(true));
            }
            Err(wire(ErrorKind::JavascriptError))
        }

        async fn find_element(&self, locator: &Locator) -> Result<ElementRef, RenderError> {
            let n = self.state.finds.fetch_add(1, Ordering::SeqCst);
            if self.script.absent {
                return Err(wire(ErrorKind::NoSuchElement));
            }
            if n < self.script.stale_finds {
                return Err(wire(ErrorKind::StaleElementReference));
            }
            Ok(ElementRef(locator.to_string()))
        }

        async fn element_property(
            &self,
            _element: &ElementRef,
            name: &str,
        ) -> Result<Option<String>, RenderError> {
            assert_eq!(name, "text");
            if let Some(stuck) = &self.script.stuck_on {
                return Ok(Some(stuck.clone()));
            }
            Ok(self.state.selected.lock().unwrap().clone())
        }

        async fn page_source(&self) -> Result<String, RenderError> {
            if self.script.panic_on_source {
                panic!("renderer crashed");
            }
            let n = self.state.sources.fetch_add(1, Ordering::SeqCst);
            if n < self.script.stale_sources {
                return Err(wire(ErrorKind::StaleElementReference));
            }
            Ok("<html><body><p>ok</p></body></html>".into())
        }

        async fn close(&self) -> Result<(), RenderError> {
            self.state.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn source() -> SourceConfig {
        SourceConfig {
            name: "test".into(),
            url: "http://results.local/".into(),
            strategy: crate::parse::StrategyKind::DomTree,
            fallback: None,
            period_control: Some("month".into()),
            draw_control: Some("draw".into()),
            loading_indicator: Some(".loading-indicator".into()),
            ready_selector: Some("#results".into()),
            container_selector: "#results".into(),
            settle_ms: 2_000,
        }
    }

    fn query(draw: Option<&str>) -> FetchQuery {
        FetchQuery {
            period: "mars 2025".into(),
            draw_filter: draw.map(String::from),
            wait_budget: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn captures_after_selection_and_closes() {
        tokio::time::pause();
        let (backend, state) = fake(Script {
            not_ready_polls: 2,
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());

        let doc = fetcher.fetch(&source(), &query(Some("Star 14H"))).await.unwrap();
        assert_eq!(doc.source, "test");
        assert!(doc.html.contains("<p>ok</p>"));
        assert_eq!(
            *state.selections.lock().unwrap(),
            vec!["mars 2025".to_string(), "Star 14H".to_string()]
        );
        assert!(state.closed.load(Ordering::SeqCst));
        assert_eq!(state.sessions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn draw_control_untouched_without_filter() {
        tokio::time::pause();
        let (backend, state) = fake(Script::default());
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        fetcher.fetch(&source(), &query(None)).await.unwrap();
        assert_eq!(*state.selections.lock().unwrap(), vec!["mars 2025".to_string()]);
    }

    #[tokio::test]
    async fn selection_never_reflected_is_mismatch() {
        tokio::time::pause();
        let (backend, state) = fake(Script {
            stuck_on: Some("janvier 2024".into()),
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());

        let err = fetcher.fetch(&source(), &query(None)).await.unwrap_err();
        match err {
            FetchError::SelectionMismatch {
                control,
                requested,
                observed,
                attempts,
            } => {
                assert_eq!(control, "month");
                assert_eq!(requested, "mars 2025");
                assert_eq!(observed.as_deref(), Some("janvier 2024"));
                assert_eq!(attempts, 3);
            }
            other => panic!("expected SelectionMismatch, got {:?}", other),
        }
        assert_eq!(state.selections.lock().unwrap().len(), 3);
        assert!(state.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn stale_handles_are_re_resolved() {
        tokio::time::pause();
        let (backend, state) = fake(Script {
            stale_finds: 3,
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        fetcher.fetch(&source(), &query(None)).await.unwrap();
        assert!(state.finds.load(Ordering::SeqCst) > 3);
    }

    #[tokio::test]
    async fn persistent_staleness_is_stale_handle() {
        tokio::time::pause();
        let (backend, state) = fake(Script {
            stale_finds: usize::MAX,
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        let err = fetcher.fetch(&source(), &query(None)).await.unwrap_err();
        assert!(
            matches!(err, FetchError::StaleHandle { attempts: 5, .. }),
            "got {:?}",
            err
        );
        assert_eq!(state.finds.load(Ordering::SeqCst), 5);
        assert!(state.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn never_ready_times_out() {
        tokio::time::pause();
        let (backend, state) = fake(Script {
            never_ready: true,
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        let err = fetcher.fetch(&source(), &query(None)).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert!(state.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn hung_navigation_hits_ceiling() {
        tokio::time::pause();
        let (backend, state) = fake(Script {
            hang_on_navigate: true,
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        let err = fetcher.fetch(&source(), &query(None)).await.unwrap_err();
        match err {
            FetchError::Timeout { waited, .. } => {
                assert_eq!(waited, fetcher.ceiling(&source(), &query(None)))
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
        assert!(state.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn panic_while_driving_is_reported_and_session_closed() {
        tokio::time::pause();
        let (backend, state) = fake(Script {
            panic_on_source: true,
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        let err = fetcher.fetch(&source(), &query(None)).await.unwrap_err();
        match err {
            FetchError::Backend(msg) => assert!(msg.contains("renderer crashed")),
            other => panic!("expected Backend, got {:?}", other),
        }
        assert!(state.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn session_open_failure_is_network() {
        let (backend, state) = fake(Script {
            fail_open: true,
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        let err = fetcher.fetch(&source(), &query(None)).await.unwrap_err();
        assert_eq!(err.kind(), "network");
        assert_eq!(state.sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn hung_session_open_hits_ceiling() {
        tokio::time::pause();
        let (backend, state) = fake(Script {
            hang_on_open: true,
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        let err = fetcher.fetch(&source(), &query(None)).await.unwrap_err();
        match err {
            FetchError::Timeout { waited, .. } => {
                assert_eq!(waited, fetcher.ceiling(&source(), &query(None)))
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
        assert_eq!(state.sessions.load(Ordering::SeqCst), 0);
        assert!(!state.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unbounded_wait_budget_does_not_overflow() {
        tokio::time::pause();
        let (backend, state) = fake(Script::default());
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        let mut q = query(None);
        q.wait_budget = Duration::MAX;

        assert_eq!(fetcher.ceiling(&source(), &q), Duration::MAX);
        let doc = fetcher.fetch(&source(), &q).await.unwrap();
        assert!(doc.html.contains("<p>ok</p>"));
        assert!(state.closed.load(Ordering::SeqCst));
    }

    #[test]
    fn retry_allowance_saturates() {
        let policy = FetchPolicy {
            handle_attempts: usize::MAX,
            handle_delay_ms: u64::MAX,
            selection_attempts: usize::MAX,
            ..FetchPolicy::default()
        };
        assert_eq!(policy.retry_allowance(2), Duration::MAX);
    }

    #[tokio::test]
    async fn stale_capture_is_retried() {
        tokio::time::pause();
        let (backend, state) = fake(Script {
            stale_sources: 2,
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        let doc = fetcher.fetch(&source(), &query(None)).await.unwrap();
        assert!(doc.html.contains("<p>ok</p>"));
        assert_eq!(state.sources.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn absent_selector_reports_time_actually_waited() {
        tokio::time::pause();
        let (backend, _) = fake(Script {
            absent: true,
            // Ten seconds of the budget go to the ready check first.
            not_ready_polls: 20,
            ..Default::default()
        });
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        let mut source = source();
        source.period_control = None;
        source.draw_control = None;

        let err = fetcher.fetch(&source, &query(None)).await.unwrap_err();
        match err {
            FetchError::Timeout { what, waited } => {
                assert_eq!(what, "#results to appear");
                assert!(waited >= Duration::from_secs(19), "waited {:?}", waited);
                assert!(waited < Duration::from_secs(25), "waited {:?}", waited);
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[test]
    fn ceiling_covers_every_phase() {
        let (backend, _) = fake(Script::default());
        let fetcher = Fetcher::new(backend, FetchPolicy::default());
        let ceiling = fetcher.ceiling(&source(), &query(None));
        assert!(ceiling > Duration::from_secs(60 + 30 + 2));
    }
}
