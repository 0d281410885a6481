use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for browser operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Error types for browser operations
#[derive(Debug, Error)]
pub enum DriverError {
    /// The browser could not be started
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Page load failed
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// No element matched the selector
    #[error("no element matches selector '{0}'")]
    ElementNotFound(String),

    /// The automation protocol reported an error
    #[error("browser protocol error: {0}")]
    Protocol(String),

    /// An operation did not finish in time
    #[error("timed out: {0}")]
    Timeout(String),

    /// Screenshot encoding failed
    #[error("image error: {0}")]
    Image(String),
}

impl From<image::ImageError> for DriverError {
    fn from(err: image::ImageError) -> Self {
        DriverError::Image(err.to_string())
    }
}

/// Kind of a JavaScript dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    Alert,
    Confirm,
    Prompt,
    BeforeUnload,
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DialogKind::Alert => "alert",
            DialogKind::Confirm => "confirm",
            DialogKind::Prompt => "prompt",
            DialogKind::BeforeUnload => "beforeunload",
        };
        f.write_str(name)
    }
}

/// A dialog raised by the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialog {
    pub kind: DialogKind,
    pub message: String,
    /// Prefilled text of a prompt dialog
    pub default_prompt: Option<String>,
}

/// Stream of dialogs raised by one page
pub type DialogStream = BoxStream<'static, Dialog>;

/// One browser page under automation
///
/// Implementations:
/// - `ChromePage` drives headless Chromium over CDP
/// - `MockPage` is an in-memory scriptable page for testing
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load a URL and wait for the load event
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// Whether an element matching the selector exists and is visible
    async fn is_visible(&self, selector: &str) -> DriverResult<bool>;

    /// Replace the value of an input element
    async fn fill(&self, selector: &str, value: &str) -> DriverResult<()>;

    /// Click an element
    async fn click(&self, selector: &str) -> DriverResult<()>;

    /// Capture the page as PNG bytes
    async fn screenshot(&self) -> DriverResult<Vec<u8>>;

    /// Subscribe to dialogs raised by this page
    async fn dialogs(&self) -> DriverResult<DialogStream>;

    /// Accept an open dialog
    async fn accept_dialog(&self, dialog: &Dialog) -> DriverResult<()>;

    /// Close the page
    async fn close(&self) -> DriverResult<()>;

    /// Source type identifier (e.g., "chrome", "mock")
    fn source_type(&self) -> &str;
}

/// A browser able to open fresh pages
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open a new blank page
    async fn open_page(&self) -> DriverResult<Arc<dyn PageDriver>>;

    /// Close the browser
    async fn shutdown(&self) -> DriverResult<()>;
}
