use std::collections::HashSet;

use tracing::debug;

use crate::error::FilterResult;
use crate::query::{Executor, QuerySet, Value};

/// Collapses the duplicate parent rows a to-many join produces.
///
/// The primary keys of the duplicated queryset are read in order, repeats
/// are dropped, and the unfiltered collection is re-queried for exactly
/// those keys, ordered by their first-seen position. The keys already
/// satisfy every predicate, so none of them is joined again.
pub struct Deduplicator<'e> {
	executor: &'e Executor<'e>,
}

impl<'e> Deduplicator<'e> {
	pub fn new(executor: &'e Executor<'e>) -> Self {
		Self { executor }
	}

	pub fn filter_queryset(&self, duplicated: &QuerySet) -> FilterResult<QuerySet> {
		let model = self.executor.schema().get_model(duplicated.model())?;
		let keys = self.executor.values_list(duplicated, &model.primary_key)?;
		let unique = first_seen(keys.iter());

		debug!(
			collection = %model.name,
			rows = keys.len(),
			unique = unique.len(),
			"deduplicating to-many join"
		);

		let mut queryset = QuerySet::new(duplicated.model())
			.filter_keys(unique.iter().cloned())
			.order_by_position(&unique);
		if let Some(columns) = duplicated.projection() {
			queryset = queryset.only(columns.to_vec());
		}
		for relation in duplicated.includes() {
			queryset = queryset.include(relation.clone());
		}
		Ok(queryset)
	}
}

fn first_seen<'v>(keys: impl Iterator<Item = &'v Value>) -> Vec<Value> {
	let mut seen = HashSet::new();
	keys.filter(|key| seen.insert(*key)).cloned().collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::query::Direction;
	use crate::schema::FieldResolver;
	use crate::test_fixtures::{self, ids};

	#[test]
	fn test_first_seen_keeps_order() {
		let keys = [3, 1, 3, 2, 1].map(Value::Integer);
		assert_eq!(first_seen(keys.iter()), [3, 1, 2].map(Value::Integer).to_vec());
	}

	#[test]
	fn test_dedup_preserves_first_seen_order() {
		let schema = test_fixtures::schema();
		let store = test_fixtures::store();
		let executor = Executor::new(&schema, &store);
		let tags_name = FieldResolver::new(&schema, ".").resolve("post", "tags.name").unwrap();

		let duplicated = QuerySet::new("post").order_by(tags_name, Direction::Descending);
		let deduped = Deduplicator::new(&executor).filter_queryset(&duplicated).unwrap();

		assert_eq!(ids(&executor.fetch(&deduped).unwrap()), vec![1, 2, 3, 4]);
	}

	#[test]
	fn test_dedup_keeps_key_scope_and_projection() {
		let schema = test_fixtures::schema();
		let store = test_fixtures::store();
		let executor = Executor::new(&schema, &store);
		let tags_name = FieldResolver::new(&schema, ".").resolve("post", "tags.name").unwrap();

		let duplicated = QuerySet::new("post")
			.filter_keys([2, 3, 4].map(Value::Integer))
			.order_by(tags_name, Direction::Ascending)
			.only(vec!["id".to_string()]);
		let deduped = Deduplicator::new(&executor).filter_queryset(&duplicated).unwrap();
		let rows = executor.fetch(&deduped).unwrap();

		// untagged first, then databases, performance
		assert_eq!(ids(&rows), vec![4, 2, 3]);
		assert!(rows.iter().all(|row| row.data.len() == 1));
	}
}
