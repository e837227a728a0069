use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

use crate::error::{FilterError, FilterResult};

pub const FILTER_PARAM: &str = "filter";
pub const WHERE_PARAM: &str = "where";

/// Decoded query-string parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
	values: BTreeMap<String, String>,
}

impl QueryParams {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses an `application/x-www-form-urlencoded` query string. A repeated
	/// key keeps its last value.
	pub fn from_query_string(query: &str) -> Self {
		let query = query.strip_prefix('?').unwrap_or(query);
		url::form_urlencoded::parse(query.as_bytes())
			.map(|(k, v)| (k.into_owned(), v.into_owned()))
			.collect()
	}

	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(key, value);
		self
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.values.insert(key.into(), value.into());
	}

	/// The value of `key`, treating an empty value as absent.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.values
			.get(key)
			.map(String::as_str)
			.filter(|v| !v.is_empty())
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut params = QueryParams::new();
		for (k, v) in iter {
			params.insert(k, v);
		}
		params
	}
}

/// The parsed top-level filter object: `{where?, order?, fields?, include?, limit?, skip?}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
	document: Map<String, Json>,
}

impl FilterRequest {
	/// Reads the `filter` or `where` parameter. `None` when neither is given.
	pub fn from_params(params: &QueryParams) -> FilterResult<Option<Self>> {
		match (params.get(FILTER_PARAM), params.get(WHERE_PARAM)) {
			(Some(_), Some(_)) => Err(FilterError::ConflictingParameters),
			(None, None) => Ok(None),
			(Some(filter), None) => Self::from_document(parse_param(FILTER_PARAM, filter)?).map(Some),
			(None, Some(clause)) => {
				let clause = parse_param(WHERE_PARAM, clause)?;
				let mut document = Map::new();
				document.insert(WHERE_PARAM.to_string(), clause);
				Ok(Some(Self { document }))
			}
		}
	}

	pub fn from_document(document: Json) -> FilterResult<Self> {
		match document {
			Json::Object(document) => Ok(Self { document }),
			other => Err(FilterError::invalid_type(FILTER_PARAM, "object", &other)),
		}
	}

	/// The value of a top-level property, or `None` when it is absent or falsy.
	pub fn get(&self, property: &str) -> Option<&Json> {
		self.document.get(property).filter(|v| is_truthy(v))
	}
}

fn parse_param(param: &str, raw: &str) -> FilterResult<Json> {
	serde_json::from_str(raw).map_err(|_| FilterError::MalformedJson {
		param: param.to_string(),
	})
}

/// `null`, `false`, zero, and empty strings, arrays and objects count as unset.
pub fn is_truthy(value: &Json) -> bool {
	match value {
		Json::Null => false,
		Json::Bool(b) => *b,
		Json::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
		Json::String(s) => !s.is_empty(),
		Json::Array(items) => !items.is_empty(),
		Json::Object(map) => !map.is_empty(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_query_string_is_decoded() {
		let params = QueryParams::from_query_string("?filter=%7B%22limit%22%3A2%7D&where=");
		assert_eq!(params.get("filter"), Some(r#"{"limit":2}"#));
		assert_eq!(params.get("where"), None);
	}

	#[test]
	fn test_neither_param_is_no_request() {
		let params = QueryParams::new().with("page", "2");
		assert_eq!(FilterRequest::from_params(&params), Ok(None));
	}

	#[test]
	fn test_both_params_conflict_regardless_of_content() {
		let params = QueryParams::new()
			.with("filter", "not json at all")
			.with("where", "{}");
		assert_eq!(
			FilterRequest::from_params(&params),
			Err(FilterError::ConflictingParameters)
		);
	}

	#[test]
	fn test_bare_where_is_wrapped() {
		let params = QueryParams::new().with("where", r#"{"age": 3}"#);
		let request = FilterRequest::from_params(&params).unwrap().unwrap();
		assert_eq!(request.get("where"), Some(&json!({"age": 3})));
	}

	#[test]
	fn test_malformed_json_names_the_param() {
		for param in ["filter", "where"] {
			let params = QueryParams::new().with(param, "{not valid json");
			assert_eq!(
				FilterRequest::from_params(&params),
				Err(FilterError::MalformedJson {
					param: param.to_string()
				})
			);
		}
	}

	#[test]
	fn test_filter_must_be_an_object() {
		let params = QueryParams::new().with("filter", "[1, 2]");
		let err = FilterRequest::from_params(&params).unwrap_err();
		assert_eq!(err.to_string(), "Filter 'filter' should be object, got - array");
	}

	#[test]
	fn test_falsy_properties_are_absent() {
		let request = FilterRequest::from_document(json!({
			"where": {},
			"order": "",
			"fields": [],
			"limit": 0,
			"include": null,
			"skip": 4
		}))
		.unwrap();
		for property in ["where", "order", "fields", "limit", "include", "missing"] {
			assert_eq!(request.get(property), None, "{}", property);
		}
		assert_eq!(request.get("skip"), Some(&json!(4)));
	}
}
