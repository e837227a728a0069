//! Row storage collaborators: the [`RowStore`] trait, an in-memory
//! implementation and a JSON fixture loader.

mod fixture;
mod memory;

pub use fixture::Fixture;
pub use memory::MemoryStore;

use crate::error::FilterResult;
use crate::query::Row;

pub trait RowStore: Send + Sync {
	fn create_collection(&mut self, name: &str) -> FilterResult<()>;
	fn insert_row(&mut self, collection: &str, row: Row) -> FilterResult<()>;
	fn scan(&self, collection: &str) -> FilterResult<Vec<Row>>;
	fn collection_names(&self) -> Vec<String>;
}
