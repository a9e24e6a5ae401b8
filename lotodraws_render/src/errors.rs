//! Error types for the WebDriver client.

use crate::types::ErrorKind;

/// Errors that can occur when talking to a WebDriver endpoint.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The HTTP exchange itself failed (connection refused, timeout, unreadable body).
    #[error("Request failed")]
    RequestFailed,
    /// The endpoint returned a non-success status without a WebDriver error payload.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The endpoint returned a WebDriver error payload.
    #[error("WebDriver error ({kind}): {message}")]
    WebDriver { kind: ErrorKind, message: String },
    /// The reply could not be decoded into the expected shape.
    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),
}

impl Error {
    /// True when the referenced element is no longer attached to the document.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Error::WebDriver {
                kind: ErrorKind::StaleElementReference,
                ..
            }
        )
    }

    /// True when a locator matched nothing.
    pub fn is_no_such_element(&self) -> bool {
        matches!(
            self,
            Error::WebDriver {
                kind: ErrorKind::NoSuchElement,
                ..
            }
        )
    }

    /// True when the failure happened below the WebDriver protocol layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::RequestFailed | Error::HttpStatus { .. })
    }
}
