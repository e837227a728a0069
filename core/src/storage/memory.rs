use std::collections::HashMap;

use super::RowStore;
use crate::error::{FilterError, FilterResult};
use crate::query::Row;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
	collections: HashMap<String, Vec<Row>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self {
			collections: HashMap::new(),
		}
	}

	pub fn len(&self, collection: &str) -> usize {
		self.collections.get(collection).map_or(0, Vec::len)
	}
}

impl RowStore for MemoryStore {
	fn create_collection(&mut self, name: &str) -> FilterResult<()> {
		self.collections.entry(name.to_string()).or_default();
		Ok(())
	}

	fn insert_row(&mut self, collection: &str, row: Row) -> FilterResult<()> {
		let rows = self
			.collections
			.get_mut(collection)
			.ok_or_else(|| FilterError::CollectionNotFound(collection.to_string()))?;

		rows.push(row);
		Ok(())
	}

	fn scan(&self, collection: &str) -> FilterResult<Vec<Row>> {
		self.collections
			.get(collection)
			.cloned()
			.ok_or_else(|| FilterError::CollectionNotFound(collection.to_string()))
	}

	fn collection_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.collections.keys().cloned().collect();
		names.sort();
		names
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::query::Value;

	#[test]
	fn test_insert_and_scan_preserve_order() {
		let mut store = MemoryStore::new();
		store.create_collection("person").unwrap();
		for id in [3, 1, 2] {
			let row: Row = [("id", Value::Integer(id))].into_iter().collect();
			store.insert_row("person", row).unwrap();
		}

		let ids: Vec<Value> = store
			.scan("person")
			.unwrap()
			.iter()
			.map(|r| r.value("id").clone())
			.collect();
		assert_eq!(ids, vec![Value::Integer(3), Value::Integer(1), Value::Integer(2)]);
	}

	#[test]
	fn test_missing_collection() {
		let mut store = MemoryStore::new();
		assert_eq!(
			store.scan("ghost"),
			Err(FilterError::CollectionNotFound("ghost".to_string()))
		);
		assert!(store.insert_row("ghost", Row::new()).is_err());
	}
}
