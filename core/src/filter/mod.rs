//! Loopback-style filter translation.
//!
//! A request carries either `filter={...}` or a bare `where={...}`. The
//! [`LoopbackFilterBackend`] parses it, resolves every field path against
//! the schema and turns each clause into a lazy [`QuerySet`](crate::query::QuerySet)
//! operation.

pub mod backend;
pub mod condition;
pub mod dedup;
pub mod fields;
pub mod operator;
pub mod order;
pub mod pagination;
pub mod params;
pub mod where_clause;

pub use backend::{LoopbackFilterBackend, Translation};
pub use condition::Condition;
pub use dedup::Deduplicator;
pub use fields::{FieldsFilter, IncludeFilter};
pub use operator::Operator;
pub use order::OrderFilter;
pub use pagination::LimitSkipFilter;
pub use params::{FilterRequest, QueryParams};
pub use where_clause::WhereFilter;
