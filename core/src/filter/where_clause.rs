use serde_json::Value as Json;

use super::condition::Condition;
use super::params::WHERE_PARAM;
use crate::error::{FilterError, FilterResult};
use crate::query::{Predicate, QuerySet};
use crate::schema::FieldResolver;

/// The `where` stage: a whole clause compiled into one predicate.
#[derive(Debug, Clone)]
pub struct WhereFilter {
	predicate: Predicate,
	to_many: bool,
}

impl WhereFilter {
	pub fn new(resolver: &FieldResolver<'_>, model: &str, clause: &Json) -> FilterResult<Self> {
		if !clause.is_object() {
			return Err(FilterError::invalid_type(WHERE_PARAM, "object", clause));
		}
		let (predicate, to_many) = Condition::parse(clause)?.compose(resolver, model)?;
		Ok(Self { predicate, to_many })
	}

	pub fn has_to_many(&self) -> bool {
		self.to_many
	}

	pub fn filter_queryset(self, queryset: QuerySet) -> QuerySet {
		queryset.filter(self.predicate)
	}
}
