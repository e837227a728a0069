use serde_json::Value as Json;

use super::operator::compile_leaf;
use crate::error::{FilterError, FilterResult};
use crate::query::Predicate;
use crate::schema::FieldResolver;

const AND: &str = "and";
const OR: &str = "or";

/// Canonical form of a `where` clause.
///
/// Every JSON object becomes an [`Condition::All`] of its keys, so a
/// one-key object and a many-key object compose the same way.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
	All(Vec<Condition>),
	Any(Vec<Condition>),
	Leaf { path: String, value: Json },
}

impl Condition {
	pub fn parse(clause: &Json) -> FilterResult<Self> {
		let Json::Object(entries) = clause else {
			return Err(FilterError::malformed_operand(AND, clause));
		};

		let mut parts = Vec::with_capacity(entries.len());
		for (key, value) in entries {
			let part = match key.as_str() {
				AND => Condition::All(Self::parse_branches(AND, value)?),
				OR => Condition::Any(Self::parse_branches(OR, value)?),
				path => Condition::Leaf {
					path: path.to_string(),
					value: value.clone(),
				},
			};
			parts.push(part);
		}
		Ok(Condition::All(parts))
	}

	fn parse_branches(operator: &str, value: &Json) -> FilterResult<Vec<Condition>> {
		match value {
			Json::Array(branches) if !branches.is_empty() && branches.iter().all(Json::is_object) => {
				branches.iter().map(Self::parse).collect()
			}
			_ => Err(FilterError::malformed_operand(operator, value)),
		}
	}

	/// Resolves every leaf against `model` and builds the predicate tree.
	///
	/// The flag is true when any resolved path crossed a to-many relation.
	pub fn compose(&self, resolver: &FieldResolver<'_>, model: &str) -> FilterResult<(Predicate, bool)> {
		match self {
			Condition::Leaf { path, value } => {
				let field = resolver.resolve(model, path)?;
				let to_many = field.to_many;
				Ok((compile_leaf(&field, value)?, to_many))
			}
			Condition::All(parts) => {
				let (mut predicates, to_many) = Self::compose_all(parts, resolver, model)?;
				if predicates.len() == 1 {
					Ok((predicates.remove(0), to_many))
				} else {
					Ok((Predicate::And(predicates), to_many))
				}
			}
			Condition::Any(parts) => {
				let (mut predicates, to_many) = Self::compose_all(parts, resolver, model)?;
				if predicates.len() == 1 {
					Ok((predicates.remove(0), to_many))
				} else {
					Ok((Predicate::Or(predicates), to_many))
				}
			}
		}
	}

	fn compose_all(
		parts: &[Condition],
		resolver: &FieldResolver<'_>,
		model: &str,
	) -> FilterResult<(Vec<Predicate>, bool)> {
		let mut predicates = Vec::with_capacity(parts.len());
		let mut to_many = false;
		for part in parts {
			let (predicate, crossed) = part.compose(resolver, model)?;
			to_many |= crossed;
			predicates.push(predicate);
		}
		Ok((predicates, to_many))
	}
}
