pub mod escape;
pub mod locator;
pub mod resolution;

pub use escape::{aria_label_css, xpath_literal};
pub use locator::{ClassifyMode, Locator, LocatorError, LocatorKind, Query, QueryKind};
pub use resolution::{
    ElementNotFound, Family, QueryAttempt, QueryBackend, QueryError, ResolutionEngine,
    ResolveError, ScopeError, SearchScope, option_queries, plan_for,
};
