use serde_json::Value as Json;
use std::str::FromStr;

use crate::error::{FilterError, FilterResult};
use crate::query::{CompareOp, Pattern, Predicate, Value};
use crate::schema::ResolvedField;

/// Operators accepted inside a `where` leaf: `{field: {operator: operand}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
	Eq,
	Neq,
	Gt,
	Gte,
	Lt,
	Lte,
	Inq,
	Nin,
	Between,
	Like,
	Nlike,
	Ilike,
	Nilike,
	Regexp,
}

impl Operator {
	pub fn name(self) -> &'static str {
		match self {
			Operator::Eq => "eq",
			Operator::Neq => "neq",
			Operator::Gt => "gt",
			Operator::Gte => "gte",
			Operator::Lt => "lt",
			Operator::Lte => "lte",
			Operator::Inq => "inq",
			Operator::Nin => "nin",
			Operator::Between => "between",
			Operator::Like => "like",
			Operator::Nlike => "nlike",
			Operator::Ilike => "ilike",
			Operator::Nilike => "nilike",
			Operator::Regexp => "regexp",
		}
	}

	/// Builds the comparison for `field`, validating the operand's shape first.
	pub fn compile(self, field: &ResolvedField, operand: &Json) -> FilterResult<CompareOp> {
		match self {
			Operator::Eq => Ok(CompareOp::Eq(self.scalar(field, operand, true)?)),
			Operator::Neq => Ok(CompareOp::Neq(self.scalar(field, operand, true)?)),
			Operator::Gt => Ok(CompareOp::Gt(self.scalar(field, operand, false)?)),
			Operator::Gte => Ok(CompareOp::Gte(self.scalar(field, operand, false)?)),
			Operator::Lt => Ok(CompareOp::Lt(self.scalar(field, operand, false)?)),
			Operator::Lte => Ok(CompareOp::Lte(self.scalar(field, operand, false)?)),
			Operator::Inq => Ok(CompareOp::In(self.list(field, operand)?)),
			Operator::Nin => Ok(CompareOp::NotIn(self.list(field, operand)?)),
			Operator::Between => match operand.as_array().map(Vec::as_slice) {
				Some([low, high]) => Ok(CompareOp::Between(
					self.scalar(field, low, false)?,
					self.scalar(field, high, false)?,
				)),
				_ => Err(FilterError::malformed_operand(self.name(), operand)),
			},
			Operator::Like => Ok(CompareOp::Like(self.pattern(operand)?)),
			Operator::Nlike => Ok(CompareOp::NotLike(self.pattern(operand)?)),
			Operator::Ilike => Ok(CompareOp::Like(self.pattern(operand)?)),
			Operator::Nilike => Ok(CompareOp::NotLike(self.pattern(operand)?)),
			Operator::Regexp => Ok(CompareOp::Regexp(self.pattern(operand)?)),
		}
	}

	fn scalar(self, field: &ResolvedField, operand: &Json, allow_null: bool) -> FilterResult<Value> {
		if operand.is_array() || operand.is_object() || (operand.is_null() && !allow_null) {
			return Err(FilterError::malformed_operand(self.name(), operand));
		}
		Value::coerce(operand, field.field.field_type)
			.ok_or_else(|| FilterError::malformed_operand(self.name(), operand))
	}

	fn list(self, field: &ResolvedField, operand: &Json) -> FilterResult<Vec<Value>> {
		let items = operand
			.as_array()
			.ok_or_else(|| FilterError::malformed_operand(self.name(), operand))?;
		items
			.iter()
			.map(|item| self.scalar(field, item, true))
			.collect()
	}

	fn pattern(self, operand: &Json) -> FilterResult<Pattern> {
		let source = operand
			.as_str()
			.ok_or_else(|| FilterError::malformed_operand(self.name(), operand))?;
		let compiled = match self {
			Operator::Regexp => Pattern::from_regexp(source),
			Operator::Ilike | Operator::Nilike => Pattern::from_like(source, true),
			_ => Pattern::from_like(source, false),
		};
		compiled.map_err(|_| FilterError::malformed_operand(self.name(), operand))
	}
}

impl FromStr for Operator {
	type Err = FilterError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"eq" => Operator::Eq,
			"neq" => Operator::Neq,
			"gt" => Operator::Gt,
			"gte" => Operator::Gte,
			"lt" => Operator::Lt,
			"lte" => Operator::Lte,
			"inq" => Operator::Inq,
			"nin" => Operator::Nin,
			"between" => Operator::Between,
			"like" => Operator::Like,
			"nlike" => Operator::Nlike,
			"ilike" => Operator::Ilike,
			"nilike" => Operator::Nilike,
			"regexp" => Operator::Regexp,
			other => {
				return Err(FilterError::UnsupportedOperator {
					operator: other.to_string(),
				});
			}
		})
	}
}

/// Compiles the value side of a leaf condition against a resolved field.
///
/// Scalars mean equality, arrays mean inclusion, and an object holds one or
/// more `{operator: operand}` pairs that must all hold.
pub fn compile_leaf(field: &ResolvedField, value: &Json) -> FilterResult<Predicate> {
	let compare = |op: CompareOp| Predicate::Compare {
		field: field.clone(),
		op,
	};

	match value {
		Json::Array(_) => Ok(compare(Operator::Inq.compile(field, value)?)),
		Json::Object(operators) => {
			if operators.is_empty() {
				return Err(FilterError::malformed_operand(Operator::Eq.name(), value));
			}
			let mut predicates = operators
				.iter()
				.map(|(name, operand)| {
					let operator: Operator = name.parse()?;
					Ok(compare(operator.compile(field, operand)?))
				})
				.collect::<FilterResult<Vec<_>>>()?;

			if predicates.len() == 1 {
				Ok(predicates.remove(0))
			} else {
				Ok(Predicate::And(predicates))
			}
		}
		scalar => Ok(compare(Operator::Eq.compile(field, scalar)?)),
	}
}
