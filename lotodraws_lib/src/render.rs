//! Rendering backend seam.
//!
//! The fetcher drives a browser through these traits. Production code uses
//! [`WebDriverBackend`]; tests plug in scripted sessions.

use async_trait::async_trait;
use lotodraws_render::{Capabilities, Client, ElementRef, Locator, Session};
use serde_json::Value;

pub use lotodraws_render::Error as RenderError;

/// Something that can open browser sessions.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// One live browser session. Closed explicitly; never reused across invocations.
#[async_trait]
pub trait RenderSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), RenderError>;

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, RenderError>;

    async fn find_element(&self, locator: &Locator) -> Result<ElementRef, RenderError>;

    async fn element_property(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, RenderError>;

    async fn page_source(&self) -> Result<String, RenderError>;

    async fn close(&self) -> Result<(), RenderError>;
}

/// Headless Chrome behind a W3C WebDriver endpoint.
#[derive(Clone)]
pub struct WebDriverBackend {
    client: Client,
    capabilities: Capabilities,
}

impl WebDriverBackend {
    pub fn new(webdriver_url: &str) -> Result<Self, RenderError> {
        Ok(Self {
            client: Client::with_base_url(webdriver_url)?,
            capabilities: Capabilities::default(),
        })
    }
}

#[async_trait]
impl RenderBackend for WebDriverBackend {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let session = self.client.new_session(&self.capabilities).await?;
        tracing::info!(session = session.id(), endpoint = self.client.base_url(), "opened rendering session");
        Ok(Box::new(WebDriverSession(session)))
    }
}

struct WebDriverSession(Session);

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        self.0.navigate(url).await
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, RenderError> {
        self.0.execute(script, args).await
    }

    async fn find_element(&self, locator: &Locator) -> Result<ElementRef, RenderError> {
        self.0.find_element(locator).await
    }

    async fn element_property(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, RenderError> {
        self.0.element_property(element, name).await
    }

    async fn page_source(&self) -> Result<String, RenderError> {
        self.0.page_source().await
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.0.delete().await
    }
}
