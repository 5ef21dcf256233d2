//! Context narrowing.
//!
//! Narrowing replaces the mutable within/frame globals helper classes tend
//! to grow with an explicit stack of search roots threaded through the call
//! chain: push to narrow, pop to unwind. Every resolution between the push
//! and the pop runs under the narrowed root.

use thiserror::Error;
use tracing::debug;

use crate::locator::Locator;
use crate::resolution::backend::{QueryBackend, QueryError};
use crate::resolution::engine::{ResolutionEngine, ResolveError};
use crate::resolution::plan::Family;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScopeError {
    /// Frame narrowing requested while another narrowing is active. Frame
    /// roots live in a different document, so they only stack on the base.
    #[error("cannot enter frame \"{0}\" while a narrowing is active")]
    NestedWithin(String),

    /// The context locator matched nothing under the current root.
    #[error("context element \"{0}\" was not found")]
    ContextNotFound(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// A stack of search roots. The base root is fixed at construction; each
/// [`SearchScope::narrow`] pushes a tighter root and [`SearchScope::pop`]
/// unwinds one level.
pub struct SearchScope<R> {
    base: R,
    narrowed: Vec<R>,
    frame: bool,
}

impl<R: Send + Sync> SearchScope<R> {
    pub fn new(base: R) -> Self {
        Self {
            base,
            narrowed: Vec::new(),
            frame: false,
        }
    }

    /// The root all resolutions currently run under.
    pub fn current(&self) -> &R {
        self.narrowed.last().unwrap_or(&self.base)
    }

    /// How many narrowing levels are active.
    pub fn depth(&self) -> usize {
        self.narrowed.len()
    }

    /// Whether the current root is frame-scoped.
    pub fn in_frame(&self) -> bool {
        self.frame
    }

    /// Narrow to `context`. Frame locators produce a frame-scoped root via
    /// the driver; anything else resolves as a generic element under the
    /// current root and scopes to the first match.
    pub async fn narrow<B>(&mut self, context: &Locator, backend: &mut B) -> Result<(), ScopeError>
    where
        B: QueryBackend<Root = R>,
    {
        if let Some(chain) = context.frame_chain() {
            if self.depth() > 0 {
                return Err(ScopeError::NestedWithin(context.to_string()));
            }
            let root = backend.frame_scope(chain, self.current()).await?;
            self.narrowed.push(root);
            self.frame = true;
            debug!(%context, "entered frame scope");
            return Ok(());
        }

        let found =
            ResolutionEngine::resolve(context, Family::Element, self.current(), backend).await?;
        let Some(first) = found.first() else {
            return Err(ScopeError::ContextNotFound(context.to_string()));
        };
        let root = backend.scope_to(first).await?;
        self.narrowed.push(root);
        debug!(%context, depth = self.depth(), "narrowed to context element");
        Ok(())
    }

    /// Unwind one narrowing level. The base root is never popped; returns
    /// false once fully unwound.
    pub fn pop(&mut self) -> bool {
        let popped = self.narrowed.pop().is_some();
        if self.narrowed.is_empty() {
            self.frame = false;
        }
        popped
    }
}
