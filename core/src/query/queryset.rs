use std::collections::{HashMap, HashSet};
use std::fmt;

use super::{Predicate, Value};
use crate::schema::ResolvedField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Ascending,
	Descending,
}

impl Direction {
	/// Marker prefixed to an order-by expression.
	pub fn prefix(self) -> &'static str {
		match self {
			Direction::Ascending => "",
			Direction::Descending => "-",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderBy {
	Field {
		field: ResolvedField,
		direction: Direction,
	},
	/// Rows sort by the position of their primary key; unknown keys go last.
	Rank(HashMap<Value, usize>),
}

impl fmt::Display for OrderBy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderBy::Field { field, direction } => write!(f, "{}{}", direction.prefix(), field.path),
			OrderBy::Rank(ranks) => write!(f, "rank({} keys)", ranks.len()),
		}
	}
}

/// A lazy description of the rows to fetch from one collection.
///
/// Every builder method only records intent; nothing touches storage until
/// the queryset is handed to an [`Executor`](super::Executor).
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySet {
	model: String,
	predicates: Vec<Predicate>,
	ordering: Option<OrderBy>,
	projection: Option<Vec<String>>,
	includes: Vec<String>,
	key_filter: Option<HashSet<Value>>,
	offset: usize,
	limit: Option<usize>,
}

impl QuerySet {
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			predicates: Vec::new(),
			ordering: None,
			projection: None,
			includes: Vec::new(),
			key_filter: None,
			offset: 0,
			limit: None,
		}
	}

	pub fn filter(mut self, predicate: Predicate) -> Self {
		self.predicates.push(predicate);
		self
	}

	/// Replaces any previous ordering.
	pub fn order_by(mut self, field: ResolvedField, direction: Direction) -> Self {
		self.ordering = Some(OrderBy::Field { field, direction });
		self
	}

	/// Orders rows by the position of their primary key in `keys`.
	pub fn order_by_position(mut self, keys: &[Value]) -> Self {
		let mut ranks = HashMap::with_capacity(keys.len());
		for (pos, key) in keys.iter().enumerate() {
			ranks.entry(key.clone()).or_insert(pos);
		}
		self.ordering = Some(OrderBy::Rank(ranks));
		self
	}

	pub fn only(mut self, columns: Vec<String>) -> Self {
		self.projection = Some(columns);
		self
	}

	pub fn include(mut self, relation: impl Into<String>) -> Self {
		let relation = relation.into();
		if !self.includes.contains(&relation) {
			self.includes.push(relation);
		}
		self
	}

	/// Restricts the rows to those whose primary key is in `keys`.
	pub fn filter_keys(mut self, keys: impl IntoIterator<Item = Value>) -> Self {
		let keys: HashSet<Value> = keys.into_iter().collect();
		self.key_filter = Some(match self.key_filter.take() {
			Some(existing) => existing.intersection(&keys).cloned().collect(),
			None => keys,
		});
		self
	}

	/// Skips `skip` rows, then keeps at most `limit`. Composes with earlier slices.
	pub fn slice(mut self, skip: usize, limit: Option<usize>) -> Self {
		self.offset += skip;
		self.limit = match (self.limit, limit) {
			(Some(current), Some(limit)) => Some(current.saturating_sub(skip).min(limit)),
			(Some(current), None) => Some(current.saturating_sub(skip)),
			(None, limit) => limit,
		};
		self
	}

	pub fn model(&self) -> &str {
		&self.model
	}

	pub fn predicates(&self) -> &[Predicate] {
		&self.predicates
	}

	pub fn ordering(&self) -> Option<&OrderBy> {
		self.ordering.as_ref()
	}

	pub fn projection(&self) -> Option<&[String]> {
		self.projection.as_deref()
	}

	pub fn includes(&self) -> &[String] {
		&self.includes
	}

	pub fn key_filter(&self) -> Option<&HashSet<Value>> {
		self.key_filter.as_ref()
	}

	pub fn offset(&self) -> usize {
		self.offset
	}

	pub fn limit(&self) -> Option<usize> {
		self.limit
	}

	/// Every resolved path the executor has to join through.
	pub fn referenced_fields(&self) -> Vec<&ResolvedField> {
		let mut fields = Vec::new();
		for predicate in &self.predicates {
			predicate.visit_fields(&mut |field| fields.push(field));
		}
		if let Some(OrderBy::Field { field, .. }) = &self.ordering {
			fields.push(field);
		}
		fields
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_slices_compose() {
		let qs = QuerySet::new("person").slice(5, Some(10)).slice(3, Some(20));
		assert_eq!(qs.offset(), 8);
		assert_eq!(qs.limit(), Some(7));

		let qs = QuerySet::new("person").slice(0, None).slice(2, None);
		assert_eq!(qs.offset(), 2);
		assert_eq!(qs.limit(), None);
	}

	#[test]
	fn test_key_filters_intersect() {
		let qs = QuerySet::new("person")
			.filter_keys(vec![Value::Integer(1), Value::Integer(2)])
			.filter_keys(vec![Value::Integer(2), Value::Integer(3)]);
		let keys = qs.key_filter().unwrap();
		assert_eq!(keys.len(), 1);
		assert!(keys.contains(&Value::Integer(2)));
	}

	#[test]
	fn test_position_ordering_ranks_first_occurrence_index() {
		let qs = QuerySet::new("person").order_by_position(&[Value::Integer(9), Value::Integer(4)]);
		match qs.ordering() {
			Some(OrderBy::Rank(ranks)) => {
				assert_eq!(ranks.get(&Value::Integer(9)), Some(&0));
				assert_eq!(ranks.get(&Value::Integer(4)), Some(&1));
			}
			other => panic!("expected rank ordering, got {:?}", other),
		}
	}
}
