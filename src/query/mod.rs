//! Reactive query layer
//!
//! State containers wrapping one API call each, with explicit observer
//! subscriptions, staleness tracking, cross-query invalidation, and
//! client-side pagination.

pub mod catalog;
pub mod paginate;
pub mod registry;
pub mod store;

// Re-export public types
pub use catalog::{MultiTeamParams, QueryCatalog};
pub use paginate::{paginate, PageParams, Paginated, PaginatedQueryStore};
pub use registry::{QueryHandle, QueryRegistry};
pub use store::{QueryFn, QueryFuture, QueryOptions, QueryState, QueryStore};
