use thiserror::Error;

pub type FilterResult<T> = Result<T, FilterError>;

/// HTTP-mappable category of a [`FilterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	NotAcceptable,
	ParseError,
	Internal,
}

impl ErrorKind {
	pub fn status_code(self) -> u16 {
		match self {
			ErrorKind::NotAcceptable => 406,
			ErrorKind::ParseError => 400,
			ErrorKind::Internal => 500,
		}
	}
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
	#[error("Provide 'filter' OR 'where' query. Not both at the same time")]
	ConflictingParameters,

	#[error("Malformed json string for query param '{param}'")]
	MalformedJson { param: String },

	#[error(
		"Malformed parameter for 'order' filter. See https://loopback.io/doc/en/lb2/Order-filter.html"
	)]
	MalformedOrder,

	#[error("Field '{field}' for model '{model}' doesn't exist")]
	UnknownField { field: String, model: String },

	#[error("Unsupported operator '{operator}'")]
	UnsupportedOperator { operator: String },

	#[error("Malformed operand for operator '{operator}': {operand}")]
	MalformedOperand { operator: String, operand: String },

	#[error("Filter '{property}' should be {expected}, got - {actual}")]
	InvalidConditionType {
		property: String,
		expected: String,
		actual: String,
	},

	#[error("Collection '{0}' not found")]
	CollectionNotFound(String),

	#[error("Fixture error: {0}")]
	Fixture(String),
}

impl FilterError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			FilterError::ConflictingParameters | FilterError::InvalidConditionType { .. } => {
				ErrorKind::NotAcceptable
			}
			FilterError::MalformedJson { .. }
			| FilterError::MalformedOrder
			| FilterError::UnknownField { .. }
			| FilterError::UnsupportedOperator { .. }
			| FilterError::MalformedOperand { .. } => ErrorKind::ParseError,
			FilterError::CollectionNotFound(_)
			| FilterError::Fixture(_) => ErrorKind::Internal,
		}
	}

	pub(crate) fn unknown_field(field: impl Into<String>, model: impl Into<String>) -> Self {
		FilterError::UnknownField {
			field: field.into(),
			model: model.into(),
		}
	}

	pub(crate) fn malformed_operand(operator: impl Into<String>, operand: &serde_json::Value) -> Self {
		FilterError::MalformedOperand {
			operator: operator.into(),
			operand: operand.to_string(),
		}
	}

	pub(crate) fn invalid_type(
		property: impl Into<String>,
		expected: impl Into<String>,
		actual: &serde_json::Value,
	) -> Self {
		FilterError::InvalidConditionType {
			property: property.into(),
			expected: expected.into(),
			actual: json_type_name(actual).to_string(),
		}
	}
}

/// Name of a JSON value's type, as surfaced in error messages.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
	match value {
		serde_json::Value::Null => "null",
		serde_json::Value::Bool(_) => "boolean",
		serde_json::Value::Number(_) => "number",
		serde_json::Value::String(_) => "string",
		serde_json::Value::Array(_) => "array",
		serde_json::Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_kinds() {
		assert_eq!(FilterError::ConflictingParameters.kind(), ErrorKind::NotAcceptable);
		assert_eq!(
			FilterError::invalid_type("order", "string", &serde_json::json!(3)).kind(),
			ErrorKind::NotAcceptable
		);
		assert_eq!(FilterError::MalformedOrder.kind(), ErrorKind::ParseError);
		assert_eq!(
			FilterError::MalformedJson {
				param: "filter".to_string()
			}
			.kind(),
			ErrorKind::ParseError
		);
		assert_eq!(
			FilterError::CollectionNotFound("invoice".to_string()).kind().status_code(),
			500
		);
	}

	#[test]
	fn test_error_messages() {
		let err = FilterError::MalformedJson {
			param: "where".to_string(),
		};
		assert_eq!(err.to_string(), "Malformed json string for query param 'where'");

		let err = FilterError::invalid_type("order", "string", &serde_json::json!([1]));
		assert_eq!(err.to_string(), "Filter 'order' should be string, got - array");
	}
}
