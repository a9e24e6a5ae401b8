//! HTTP client for a W3C WebDriver endpoint (Selenium standalone or chromedriver).

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use crate::{
    types::{Capabilities, ElementRef, Locator, NewSession, Reply, WireError},
    Error,
};

/// HTTP timeout for a single WebDriver command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the WebDriver endpoint.
///
/// The client itself is stateless; every browser interaction happens through
/// a [`Session`] obtained from [`Client::new_session`].
#[derive(Clone)]
pub struct Client {
    /// Base URL of the endpoint, without a trailing slash.
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    /// Creates a client for the endpoint at `base_url`.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(COMMAND_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_url(&self, path: &str) -> Result<Url, Error> {
        Url::parse(format!("{}{}", &self.base_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })
    }

    async fn command<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let url = self.get_url(path)?;
        let mut req = self
            .http
            .request(method, url)
            .header("accept", "application/json");
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await.map_err(|e| {
            tracing::error!("WebDriver command {} failed: {}", path, e);
            Error::RequestFailed
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read WebDriver reply: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            if let Ok(reply) = serde_json::from_str::<Reply<WireError>>(&body) {
                tracing::debug!(
                    "WebDriver command {} returned {}: {}",
                    path,
                    reply.value.error,
                    reply.value.message
                );
                return Err(Error::WebDriver {
                    kind: reply.value.error,
                    message: reply.value.message,
                });
            }
            let snippet = truncate_body(&body);
            tracing::error!("WebDriver command {} failed with status {}: {}", path, status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let parsed = serde_json::from_str::<Reply<T>>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse WebDriver reply: {} | body: {}", e, snippet);
            Error::UnexpectedReply(e.to_string())
        })?;

        Ok(parsed.value)
    }

    /// Opens a new browser session.
    pub async fn new_session(&self, capabilities: &Capabilities) -> Result<Session, Error> {
        let created: NewSession = self
            .command(Method::POST, "/session", Some(capabilities.to_request_body()))
            .await?;
        tracing::debug!("Opened WebDriver session {}", created.session_id);
        Ok(Session {
            client: self.clone(),
            id: created.session_id,
        })
    }
}

/// A live browser session.
///
/// Sessions hold a browser process on the endpoint; call [`Session::delete`]
/// when done; dropping the value does not release the remote browser.
#[derive(Clone)]
pub struct Session {
    client: Client,
    id: String,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    fn path(&self, suffix: &str) -> String {
        format!("/session/{}{}", self.id, suffix)
    }

    /// Navigates the top-level browsing context and waits for the load event.
    pub async fn navigate(&self, url: &str) -> Result<(), Error> {
        let _: Value = self
            .client
            .command(Method::POST, &self.path("/url"), Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    /// Runs a synchronous script in the page and returns its result.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.client
            .command(
                Method::POST,
                &self.path("/execute/sync"),
                Some(json!({ "script": script, "args": args })),
            )
            .await
    }

    /// Finds the first element matching `locator`.
    pub async fn find_element(&self, locator: &Locator) -> Result<ElementRef, Error> {
        let value: Value = self
            .client
            .command(
                Method::POST,
                &self.path("/element"),
                Some(locator.to_request_body()),
            )
            .await?;
        ElementRef::from_value(&value)
            .ok_or_else(|| Error::UnexpectedReply(format!("no element reference in {}", value)))
    }

    /// Reads a DOM property of an element. `None` when the property is null.
    pub async fn element_property(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, Error> {
        let value: Value = self
            .client
            .command(
                Method::GET,
                &self.path(&format!("/element/{}/property/{}", element.0, name)),
                None,
            )
            .await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    /// Returns the serialized DOM of the current page.
    pub async fn page_source(&self) -> Result<String, Error> {
        self.client
            .command(Method::GET, &self.path("/source"), None)
            .await
    }

    /// Ends the session and releases the remote browser.
    pub async fn delete(&self) -> Result<(), Error> {
        let _: Value = self
            .client
            .command(Method::DELETE, &self.path(""), None)
            .await?;
        tracing::debug!("Closed WebDriver session {}", self.id);
        Ok(())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(1500);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = Client::with_base_url("http://localhost:4444/wd/hub/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:4444/wd/hub");
    }
}
