use super::dedup::Deduplicator;
use super::fields::{FieldsFilter, IncludeFilter};
use super::order::OrderFilter;
use super::pagination::LimitSkipFilter;
use super::params::{FilterRequest, QueryParams};
use super::where_clause::WhereFilter;
use crate::config::FilterConfig;
use crate::error::FilterResult;
use crate::query::{Executor, QuerySet, Row};
use crate::schema::{FieldResolver, Schema};
use crate::storage::RowStore;

/// Result of translating one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
	pub queryset: QuerySet,
	/// Whether the `where` or `order` path crossed a to-many relation.
	pub to_many: bool,
	pub deduplicated: bool,
}

impl Translation {
	fn unchanged(queryset: QuerySet) -> Self {
		Self {
			queryset,
			to_many: false,
			deduplicated: false,
		}
	}
}

/// Translates loopback-style `filter` / `where` query parameters into a
/// [`QuerySet`].
///
/// Stages always run in the same order: order, fields and include, where,
/// limit/skip, then deduplication when a to-many relation was crossed.
pub struct LoopbackFilterBackend<'a> {
	schema: &'a Schema,
	store: &'a dyn RowStore,
	config: FilterConfig,
}

impl<'a> LoopbackFilterBackend<'a> {
	pub fn new(schema: &'a Schema, store: &'a dyn RowStore) -> Self {
		Self {
			schema,
			store,
			config: FilterConfig::default(),
		}
	}

	pub fn with_config(mut self, config: FilterConfig) -> Self {
		self.config = config;
		self
	}

	/// Applies the request's filter to `queryset`. Without a `filter` or
	/// `where` parameter the queryset comes back unchanged.
	pub fn filter_queryset(&self, params: &QueryParams, queryset: QuerySet) -> FilterResult<QuerySet> {
		Ok(self.translate(params, queryset)?.queryset)
	}

	/// Filters `queryset` and materializes the result.
	pub fn fetch(&self, params: &QueryParams, queryset: QuerySet) -> FilterResult<Vec<Row>> {
		let queryset = self.filter_queryset(params, queryset)?;
		Executor::new(self.schema, self.store).fetch(&queryset)
	}

	pub fn translate(&self, params: &QueryParams, queryset: QuerySet) -> FilterResult<Translation> {
		match FilterRequest::from_params(params)? {
			Some(request) => self.apply(&request, queryset),
			None => Ok(Translation::unchanged(queryset)),
		}
	}

	/// Runs every stage of an already parsed request.
	pub fn apply(&self, request: &FilterRequest, queryset: QuerySet) -> FilterResult<Translation> {
		let model = self.schema.get_model(queryset.model())?;
		let resolver = FieldResolver::new(self.schema, &self.config.path_separator);
		let mut queryset = queryset;
		let mut to_many = false;

		if let Some(order) = request.get("order") {
			let order = OrderFilter::new(&resolver, &model.name, order)?;
			to_many |= order.is_to_many();
			queryset = order.filter_queryset(queryset);
		}

		if let Some(fields) = request.get("fields") {
			queryset = FieldsFilter::new(model, fields)?.filter_queryset(queryset);
		}
		if let Some(include) = request.get("include") {
			queryset = IncludeFilter::new(model, include)?.filter_queryset(queryset);
		}

		if let Some(clause) = request.get("where") {
			let filter = WhereFilter::new(&resolver, &model.name, clause)?;
			to_many |= filter.has_to_many();
			queryset = filter.filter_queryset(queryset);
		}

		queryset = LimitSkipFilter::new(request, self.config.allow_offset_alias)?.filter_queryset(queryset);

		if !(to_many && self.config.dedup_to_many) {
			return Ok(Translation {
				queryset,
				to_many,
				deduplicated: false,
			});
		}

		let executor = Executor::new(self.schema, self.store);
		let queryset = Deduplicator::new(&executor).filter_queryset(&queryset)?;
		Ok(Translation {
			queryset,
			to_many,
			deduplicated: true,
		})
	}
}
