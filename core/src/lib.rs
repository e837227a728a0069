//! lbquery - loopback-style filter translation

pub mod config;
pub mod error;
pub mod filter;
pub mod query;
pub mod render;
pub mod schema;
pub mod storage;

#[cfg(test)]
mod test_fixtures;

pub use config::{Config, FilterConfig, LogConfig};
pub use error::{ErrorKind, FilterError, FilterResult};
pub use filter::{LoopbackFilterBackend, QueryParams, Translation};
pub use query::{Executor, QuerySet, Row, Value};
pub use schema::{FieldDescriptor, FieldType, ModelSchema, RelationKind, Schema};
pub use storage::{Fixture, MemoryStore, RowStore};
