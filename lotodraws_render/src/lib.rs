//! Minimal W3C WebDriver client used as the rendering backend for result pages.

mod client;
mod errors;
pub mod types;
pub use self::client::{Client, Session};
pub use self::errors::Error;
pub use self::types::{Capabilities, ElementRef, ErrorKind, Locator};
