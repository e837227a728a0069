use serde_json::Value as Json;

use super::params::FilterRequest;
use crate::error::{FilterError, FilterResult};
use crate::query::QuerySet;

/// The `limit`/`skip` stage, applied after every filter and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimitSkipFilter {
	limit: Option<usize>,
	skip: usize,
}

impl LimitSkipFilter {
	/// Reads `limit` and `skip`. With `allow_offset`, `offset` stands in for a missing `skip`.
	pub fn new(request: &FilterRequest, allow_offset: bool) -> FilterResult<Self> {
		let limit = request.get("limit").map(|v| non_negative("limit", v)).transpose()?;
		let skip = match request.get("skip") {
			Some(skip) => Some(non_negative("skip", skip)?),
			None if allow_offset => request.get("offset").map(|v| non_negative("offset", v)).transpose()?,
			None => None,
		};
		Ok(Self {
			limit,
			skip: skip.unwrap_or(0),
		})
	}

	pub fn is_noop(&self) -> bool {
		self.limit.is_none() && self.skip == 0
	}

	pub fn filter_queryset(self, queryset: QuerySet) -> QuerySet {
		if self.is_noop() {
			return queryset;
		}
		queryset.slice(self.skip, self.limit)
	}
}

/// A non-negative integer given as a JSON number or a string of digits.
fn non_negative(property: &str, value: &Json) -> FilterResult<usize> {
	let parsed = match value {
		Json::Number(n) => n.as_u64(),
		Json::String(s) => s.trim().parse::<u64>().ok(),
		_ => None,
	};
	parsed
		.and_then(|n| usize::try_from(n).ok())
		.ok_or_else(|| FilterError::invalid_type(property, "non-negative integer", value))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn paginate(document: Json, allow_offset: bool) -> FilterResult<LimitSkipFilter> {
		LimitSkipFilter::new(&FilterRequest::from_document(document).unwrap(), allow_offset)
	}

	#[test]
	fn test_limit_and_skip() {
		let qs = paginate(json!({"limit": 10, "skip": "5"}), true)
			.unwrap()
			.filter_queryset(QuerySet::new("person"));
		assert_eq!((qs.offset(), qs.limit()), (5, Some(10)));
	}

	#[test]
	fn test_zero_values_are_unset() {
		assert!(paginate(json!({"limit": 0, "skip": 0}), true).unwrap().is_noop());
	}

	#[test]
	fn test_offset_alias() {
		assert_eq!(
			paginate(json!({"offset": 3}), true).unwrap(),
			LimitSkipFilter { limit: None, skip: 3 }
		);
		assert!(paginate(json!({"offset": 3}), false).unwrap().is_noop());
		// skip wins over offset
		assert_eq!(paginate(json!({"skip": 1, "offset": 3}), true).unwrap().skip, 1);
	}

	#[test]
	fn test_rejects_non_integers() {
		for document in [
			json!({"limit": -1}),
			json!({"limit": 2.5}),
			json!({"skip": "ten"}),
			json!({"limit": [5]}),
			json!({"skip": true}),
		] {
			assert!(
				matches!(
					paginate(document.clone(), true),
					Err(FilterError::InvalidConditionType { .. })
				),
				"{}",
				document
			);
		}
	}

	#[test]
	fn test_error_message() {
		let err = paginate(json!({"limit": "many"}), true).unwrap_err();
		assert_eq!(
			err.to_string(),
			"Filter 'limit' should be non-negative integer, got - string"
		);
	}
}
