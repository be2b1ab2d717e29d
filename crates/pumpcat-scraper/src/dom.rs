//! Browser capability seam.
//!
//! The scraper consumes the browser through two object-safe async traits,
//! [`PageDriver`] and [`ElementHandle`], so traversal and extraction logic can
//! be exercised against an in-memory fake DOM in tests. The production
//! implementation lives in [`crate::chrome`].
//!
//! Stale-element and not-found conditions are ordinary branches for callers,
//! not fatal errors; the resolver treats any per-strategy failure as a miss.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// A locator probe against the live DOM.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl Query {
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::Css(s) => write!(f, "css({s})"),
            Query::XPath(s) => write!(f, "xpath({s})"),
        }
    }
}

/// Errors surfaced by the browser capability.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No element matched a probe. A normal branch, never run-fatal.
    #[error("no element found for {query}")]
    NotFound { query: String },

    /// The element handle no longer refers to a live DOM node. Callers
    /// recover by re-resolving from scratch, never by reusing the handle.
    #[error("stale element handle: {context}")]
    Stale { context: String },

    #[error("timed out after {waited_ms}ms waiting for {what}")]
    Timeout { what: String, waited_ms: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("click failed: {reason}")]
    Click { reason: String },

    #[error("script execution failed: {reason}")]
    Script { reason: String },

    #[error("browser driver error: {0}")]
    Driver(String),
}

/// Anything that can be queried for elements: a page or an element subtree.
#[async_trait]
pub trait QueryScope: Send + Sync {
    /// Runs `probe` against this scope and returns all matches (possibly
    /// empty). Element-scoped implementations may only support CSS probes.
    async fn query(&self, probe: &Query) -> Result<Vec<Box<dyn ElementHandle>>, BrowserError>;
}

/// A handle to one matched DOM element.
#[async_trait]
pub trait ElementHandle: QueryScope {
    /// Rendered text content, trimmed.
    async fn text(&self) -> Result<String, BrowserError>;

    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError>;

    async fn is_visible(&self) -> Result<bool, BrowserError>;

    async fn is_enabled(&self) -> Result<bool, BrowserError>;

    async fn scroll_into_view(&self) -> Result<(), BrowserError>;

    /// Native (trusted-event) click.
    async fn click(&self) -> Result<(), BrowserError>;

    /// Script-based click fallback for elements behind overlays.
    async fn click_via_script(&self) -> Result<(), BrowserError>;
}

/// A live browser page.
#[async_trait]
pub trait PageDriver: QueryScope {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    async fn execute_script(&self, js: &str) -> Result<serde_json::Value, BrowserError>;

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    async fn page_source(&self) -> Result<String, BrowserError>;

    /// Navigates one step back in session history.
    async fn back(&self) -> Result<(), BrowserError>;
}
