//! Strict/fuzzy dispatch and the fallback tier loop.

use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};

use crate::locator::{Locator, LocatorError};
use crate::resolution::backend::{QueryBackend, QueryError};
use crate::resolution::plan::{Family, option_queries, plan_for};

/// Errors the resolution engine can raise.
///
/// Exhausting every tier is NOT an error: the engine returns an empty list
/// and the call site decides how to report not-found.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// The locator has no query form: an unrecognized strict object, or a
    /// frame locator outside narrowing.
    #[error("invalid locator: {0}")]
    InvalidLocator(#[from] LocatorError),

    /// The driver failed for a reason other than "zero matches".
    #[error(transparent)]
    Query(#[from] QueryError),
}

pub struct ResolutionEngine;

impl ResolutionEngine {
    /// Resolve `locator` under `root` as the given element family.
    ///
    /// A non-fuzzy locator is a direct contract with the caller about what
    /// to query: exactly one `execute`, no fallback. A fuzzy locator walks
    /// the family's tiers in order, awaiting each attempt, and stops at the
    /// first non-empty result. Failures on a best-effort tier are swallowed
    /// and the loop continues; all other failures propagate unchanged.
    pub async fn resolve<B: QueryBackend>(
        locator: &Locator,
        family: Family,
        root: &B::Root,
        backend: &mut B,
    ) -> Result<Vec<B::Element>, ResolveError> {
        let Some(text) = locator.fuzzy_text() else {
            let query = locator.simplify()?;
            trace!(%locator, %query, "strict locator, single query");
            return Ok(backend.execute(&query, root).await?);
        };

        for attempt in plan_for(family, text) {
            trace!(
                %locator,
                tier = attempt.tier,
                label = attempt.label,
                query = %attempt.query,
                "trying fallback tier"
            );
            match backend.execute(&attempt.query, root).await {
                Ok(found) if !found.is_empty() => {
                    debug!(
                        %locator,
                        tier = attempt.tier,
                        label = attempt.label,
                        matches = found.len(),
                        "fallback tier matched"
                    );
                    return Ok(found);
                }
                Ok(_) => {}
                Err(err) if attempt.best_effort => {
                    debug!(%locator, label = attempt.label, %err, "best-effort tier failed");
                }
                Err(err) => return Err(err.into()),
            }
        }

        debug!(%locator, ?family, "all fallback tiers exhausted");
        Ok(Vec::new())
    }

    /// Resolve option literals inside an already-located `<select>`.
    ///
    /// Every matching option across both per-option lookups is returned
    /// (union, deduplicated by handle equality) so multi-select steps can
    /// select them all.
    pub async fn resolve_options<B, S>(
        options: &[S],
        root: &B::Root,
        backend: &mut B,
    ) -> Result<Vec<B::Element>, ResolveError>
    where
        B: QueryBackend,
        S: AsRef<str>,
    {
        let mut selected = Vec::new();
        for option in options {
            for query in option_queries(option.as_ref()) {
                for handle in backend.execute(&query, root).await? {
                    if !selected.contains(&handle) {
                        selected.push(handle);
                    }
                }
            }
        }
        Ok(selected)
    }
}

/// Not-found diagnostic raised by call sites (click, fill, assert) after
/// the engine comes back empty. Carries the original locator rendering plus
/// the role wording each call site wants.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{prefix} \"{locator}\" was not found{suffix}")]
pub struct ElementNotFound {
    locator: String,
    prefix: &'static str,
    suffix: String,
}

impl ElementNotFound {
    pub fn new(locator: &Locator) -> Self {
        Self {
            locator: locator.to_string(),
            prefix: "Element",
            suffix: String::new(),
        }
    }

    pub fn clickable(mut self) -> Self {
        self.prefix = "Clickable element";
        self
    }

    pub fn field(mut self) -> Self {
        self.prefix = "Field";
        self
    }

    pub fn checkable(mut self) -> Self {
        self.prefix = "Checkbox or radio";
        self
    }

    /// Append a "was not found inside ..." clause naming the narrowing
    /// context.
    pub fn within(mut self, context: impl fmt::Display) -> Self {
        self.suffix = format!(" inside {context}");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_default_wording() {
        let err = ElementNotFound::new(&Locator::parse("Log In"));
        assert_eq!(err.to_string(), "Element \"Log In\" was not found");
    }

    #[test]
    fn not_found_role_and_context_wording() {
        let err = ElementNotFound::new(&Locator::parse("Email"))
            .field()
            .within("#signup-form");
        assert_eq!(
            err.to_string(),
            "Field \"Email\" was not found inside #signup-form"
        );
    }

    #[test]
    fn not_found_checkable_wording() {
        let err = ElementNotFound::new(&Locator::parse("Terms")).checkable();
        assert_eq!(err.to_string(), "Checkbox or radio \"Terms\" was not found");
    }
}
