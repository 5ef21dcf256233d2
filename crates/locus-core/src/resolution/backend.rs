//! Driver boundary.
//!
//! [`QueryBackend`] is the single effectful abstraction point in
//! resolution; everything else is pure computation over locators and query
//! templates. Implementations:
//! - real drivers: run the compiled query over a live DOM (WebDriver, CDP,
//!   mobile automation, ...)
//! - tests: table-driven mocks
//!
//! Element handles and search roots are opaque to this crate: they are
//! produced by a driver and handed back to the same driver unchanged.

use async_trait::async_trait;
use thiserror::Error;

use crate::locator::{Locator, Query};

/// Errors surfaced by a driver while executing a query.
///
/// "Zero matches" is not an error: drivers return an empty list for it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Driver-side failure (connection, protocol, timeout, ...).
    #[error("backend error: {0}")]
    Backend(String),

    /// The compiled query was rejected by the engine (bad syntax).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The driver does not implement this query kind.
    #[error("query not supported: {0}")]
    Unsupported(String),
}

/// Executes compiled queries and produces opaque element handles.
#[async_trait]
pub trait QueryBackend: Send {
    /// Opaque element handle.
    type Element: Clone + PartialEq + Send + Sync;

    /// Opaque search root: "element or document to search within".
    type Root: Send + Sync;

    /// Run one query under `root`, returning every match (possibly none).
    async fn execute(
        &mut self,
        query: &Query,
        root: &Self::Root,
    ) -> Result<Vec<Self::Element>, QueryError>;

    /// Derive a search root scoped to a previously found element.
    async fn scope_to(&mut self, element: &Self::Element) -> Result<Self::Root, QueryError>;

    /// Derive a search root inside a frame chain (outermost first).
    /// Crossing frame document boundaries is driver-specific, so the whole
    /// chain is delegated in one call.
    async fn frame_scope(
        &mut self,
        frames: &[Locator],
        root: &Self::Root,
    ) -> Result<Self::Root, QueryError>;
}
