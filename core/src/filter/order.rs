use serde_json::Value as Json;

use crate::error::{FilterError, FilterResult};
use crate::query::{Direction, QuerySet};
use crate::schema::{FieldResolver, ResolvedField};

/// The `order` stage: `"<fieldPath> <ASC|DESC>"`.
#[derive(Debug, Clone)]
pub struct OrderFilter {
	field: ResolvedField,
	direction: Direction,
}

impl OrderFilter {
	pub fn new(resolver: &FieldResolver<'_>, model: &str, order: &Json) -> FilterResult<Self> {
		let Some(order) = order.as_str() else {
			return Err(FilterError::invalid_type("order", "string", order));
		};

		let tokens: Vec<&str> = order.split(' ').collect();
		let [path, direction] = tokens.as_slice() else {
			return Err(FilterError::MalformedOrder);
		};
		let direction = match *direction {
			"ASC" => Direction::Ascending,
			"DESC" => Direction::Descending,
			_ => return Err(FilterError::MalformedOrder),
		};

		let field = resolver.resolve(model, path)?;
		Ok(Self { field, direction })
	}

	pub fn is_to_many(&self) -> bool {
		self.field.to_many
	}

	pub fn filter_queryset(self, queryset: QuerySet) -> QuerySet {
		queryset.order_by(self.field, self.direction)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::query::OrderBy;
	use crate::test_fixtures;
	use serde_json::json;

	fn order(value: Json) -> FilterResult<OrderFilter> {
		let schema = test_fixtures::schema();
		OrderFilter::new(&FieldResolver::new(&schema, "."), "post", &value)
	}

	#[test]
	fn test_descending_order_is_prefixed() {
		let qs = order(json!("title DESC"))
			.unwrap()
			.filter_queryset(QuerySet::new("post"));
		assert_eq!(qs.ordering().map(OrderBy::to_string), Some("-title".to_string()));
	}

	#[test]
	fn test_to_many_path_is_flagged() {
		assert!(order(json!("tags.name ASC")).unwrap().is_to_many());
		assert!(!order(json!("author.name ASC")).unwrap().is_to_many());
	}

	#[test]
	fn test_malformed_orders() {
		for value in ["title", "title asc", "title ASC extra", "title  ASC", "title DOWN", " title ASC"] {
			assert_eq!(
				order(json!(value)).err(),
				Some(FilterError::MalformedOrder),
				"{:?}",
				value
			);
		}
	}

	#[test]
	fn test_non_string_order() {
		let err = order(json!(["title", "ASC"])).unwrap_err();
		assert_eq!(err.to_string(), "Filter 'order' should be string, got - array");
	}

	#[test]
	fn test_unknown_order_field() {
		assert!(matches!(
			order(json!("rating DESC")),
			Err(FilterError::UnknownField { .. })
		));
	}
}
