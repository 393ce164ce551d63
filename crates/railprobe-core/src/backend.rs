use crate::locator::LocatorCandidate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// Opaque reference to an element located on the live page.
///
/// A handle is only meaningful inside the document it was found in. Drivers
/// reject handles from a previous navigation with [`DriverError::ElementStale`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    id: u64,
    document: String,
}

impl ElementHandle {
    pub fn new(id: u64, document: impl Into<String>) -> Self {
        Self {
            id,
            document: document.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Identity of the document the element was found in.
    pub fn document(&self) -> &str {
        &self.document
    }
}

/// Element box in viewport CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// `document.readyState` is `complete`.
    Load,
    /// Loaded and no new network resources for a quiet period.
    NetworkIdle,
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum DriverError {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element {id} is stale (page navigated or node removed)")]
    ElementStale { id: u64 },

    #[error("Element {id} is not visible")]
    ElementNotVisible { id: u64 },

    #[error("Element {id} is not interactable: {reason}")]
    ElementNotInteractable { id: u64, reason: String },

    #[error("Invalid selector: {selector}")]
    SelectorInvalid { selector: String },

    #[error("Script execution error: {0}")]
    ScriptError(String),

    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    #[error("Connection lost")]
    ConnectionLost,

    #[error("Not ready")]
    NotReady,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Other: {0}")]
    Other(String),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Serialization(err.to_string())
    }
}

impl DriverError {
    pub fn timeout(operation: impl Into<String>) -> Self {
        DriverError::Timeout {
            operation: operation.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DriverError::Navigation(_) => "NAVIGATION_ERROR",
            DriverError::ElementStale { .. } => "ELEMENT_STALE",
            DriverError::ElementNotVisible { .. } => "ELEMENT_NOT_VISIBLE",
            DriverError::ElementNotInteractable { .. } => "ELEMENT_NOT_INTERACTABLE",
            DriverError::SelectorInvalid { .. } => "SELECTOR_INVALID",
            DriverError::ScriptError(_) => "SCRIPT_ERROR",
            DriverError::Timeout { .. } => "TIMEOUT",
            DriverError::ConnectionLost => "CONNECTION_LOST",
            DriverError::NotReady => "NOT_READY",
            DriverError::Io(_) => "IO_ERROR",
            DriverError::Serialization(_) => "SERIALIZATION_ERROR",
            DriverError::Other(_) => "INTERNAL_ERROR",
            DriverError::NotSupported(_) => "NOT_SUPPORTED",
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            DriverError::ElementStale { .. } => "Resolve the target again on the current page",
            DriverError::ElementNotVisible { .. } => "Scroll element into view or wait",
            DriverError::ElementNotInteractable { .. } => "Dismiss overlays or wait",
            DriverError::Timeout { .. } => "Increase timeout or verify condition",
            DriverError::SelectorInvalid { .. } => "Fix selector syntax",
            DriverError::Navigation(_) => "Check URL and network connectivity",
            DriverError::NotReady => "Launch the driver first",
            _ => "Check driver logs",
        }
    }
}

/// Capability interface over a live browser page.
///
/// Every waiting method takes an explicit timeout; implementations must not
/// block past it.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Launch the driver (start browser, connect to remote, etc.)
    async fn launch(&mut self) -> Result<(), DriverError>;

    /// Close the driver and cleanup resources.
    async fn close(&mut self) -> Result<(), DriverError>;

    async fn is_ready(&self) -> bool;

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, DriverError>;

    /// Navigate back in browser history.
    async fn go_back(&mut self) -> Result<NavigationResult, DriverError> {
        Err(DriverError::NotSupported("go_back".into()))
    }

    async fn current_url(&mut self) -> Result<String, DriverError>;

    async fn set_viewport(&mut self, _width: u32, _height: u32) -> Result<(), DriverError> {
        Err(DriverError::NotSupported("set_viewport".into()))
    }

    async fn wait_for_load(&mut self, state: LoadState, timeout: Duration)
        -> Result<(), DriverError>;

    /// Wait until a JavaScript predicate evaluates truthy.
    async fn wait_for_function(
        &mut self,
        predicate: &str,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// Locate the first element matching `candidate`. Does not wait.
    async fn query(
        &mut self,
        candidate: &LocatorCandidate,
    ) -> Result<Option<ElementHandle>, DriverError>;

    async fn is_visible(&mut self, element: &ElementHandle) -> Result<bool, DriverError>;

    async fn scroll_into_view(&mut self, element: &ElementHandle) -> Result<(), DriverError>;

    /// `None` when the element is detached or has no layout box.
    async fn bounding_box(
        &mut self,
        element: &ElementHandle,
    ) -> Result<Option<BoundingBox>, DriverError>;

    /// Synthetic mouse click at viewport coordinates.
    async fn click_at(&mut self, x: f64, y: f64) -> Result<(), DriverError>;

    /// Direct element click.
    async fn click(&mut self, element: &ElementHandle) -> Result<(), DriverError>;

    /// Replace the value of an input element.
    async fn fill(&mut self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    async fn input_value(&mut self, element: &ElementHandle) -> Result<String, DriverError>;

    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Press a key, focusing `element` first when given.
    async fn press_key(
        &mut self,
        element: Option<&ElementHandle>,
        key: &str,
    ) -> Result<(), DriverError>;

    /// Capture a screenshot of the current viewport as PNG.
    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError>;
}
