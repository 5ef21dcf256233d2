pub mod backend;
pub mod engine;
pub mod plan;
pub mod scope;

pub use backend::{QueryBackend, QueryError};
pub use engine::{ElementNotFound, ResolutionEngine, ResolveError};
pub use plan::{Family, QueryAttempt, option_queries, plan_for};
pub use scope::{ScopeError, SearchScope};
