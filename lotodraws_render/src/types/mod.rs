//! Wire types for the W3C WebDriver protocol.

use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value};

/// Key under which W3C WebDriver serializes element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Every WebDriver reply wraps its payload in a `value` field.
#[derive(Deserialize)]
pub struct Reply<T> {
    pub value: T,
}

/// Error payload returned with non-2xx statuses.
#[derive(Deserialize, Debug)]
pub struct WireError {
    pub error: ErrorKind,
    #[serde(default)]
    pub message: String,
}

/// The subset of WebDriver error codes the client distinguishes.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[serde(rename = "stale element reference")]
    StaleElementReference,
    #[serde(rename = "no such element")]
    NoSuchElement,
    #[serde(rename = "timeout")]
    Timeout,
    #[serde(rename = "script timeout")]
    ScriptTimeout,
    #[serde(rename = "javascript error")]
    JavascriptError,
    #[serde(rename = "invalid session id")]
    InvalidSessionId,
    #[serde(rename = "session not created")]
    SessionNotCreated,
    #[serde(other)]
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::StaleElementReference => "stale element reference",
            ErrorKind::NoSuchElement => "no such element",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ScriptTimeout => "script timeout",
            ErrorKind::JavascriptError => "javascript error",
            ErrorKind::InvalidSessionId => "invalid session id",
            ErrorKind::SessionNotCreated => "session not created",
            ErrorKind::Other => "unknown error",
        };
        write!(f, "{}", s)
    }
}

/// Reply payload of `POST /session`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub session_id: String,
}

/// Browser capabilities sent when opening a session.
#[derive(Clone, Debug)]
pub struct Capabilities {
    pub browser_name: String,
    pub args: Vec<String>,
}

impl Default for Capabilities {
    /// Headless Chrome, suitable for a remote Selenium node or a local chromedriver.
    fn default() -> Self {
        Self {
            browser_name: "chrome".to_string(),
            args: vec![
                "--headless".to_string(),
                "--disable-gpu".to_string(),
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
        }
    }
}

impl Capabilities {
    /// Serializes into the `{"capabilities": {"alwaysMatch": ...}}` request body.
    pub fn to_request_body(&self) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": self.browser_name,
                    "goog:chromeOptions": { "args": self.args },
                }
            }
        })
    }
}

/// Element location strategies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    TagName(String),
}

impl Locator {
    /// Locates by element id, expressed as a CSS id selector.
    pub fn id(id: &str) -> Self {
        Locator::Css(format!("#{}", id))
    }

    pub fn css(selector: &str) -> Self {
        Locator::Css(selector.to_string())
    }

    pub fn to_request_body(&self) -> Value {
        let (using, value) = match self {
            Locator::Css(v) => ("css selector", v),
            Locator::TagName(v) => ("tag name", v),
        };
        json!({ "using": using, "value": value })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(v) => write!(f, "css={}", v),
            Locator::TagName(v) => write!(f, "tag={}", v),
        }
    }
}

/// An opaque reference to an element in the live document.
///
/// References go stale whenever the page re-renders the node, so callers
/// should re-resolve rather than hold on to them across actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementRef(pub String);

impl ElementRef {
    /// Decodes `{"element-6066-...": "<id>"}`.
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| ElementRef(id.to_string()))
    }

    /// Encodes the reference for use as a script argument.
    pub fn to_value(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }
}
