use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::fmt;

use super::Value;
use crate::schema::ResolvedField;

/// A compiled text pattern for `like`/`regexp` style operators.
#[derive(Clone)]
pub struct Pattern {
	regex: Regex,
	source: String,
	case_insensitive: bool,
}

impl Pattern {
	/// SQL LIKE pattern: `%` matches any run, `_` one character, `\` escapes.
	pub fn from_like(pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
		let mut regex_str = String::from("^");
		let mut chars = pattern.chars();
		while let Some(ch) = chars.next() {
			match ch {
				'%' => regex_str.push_str("(?s:.*)"),
				'_' => regex_str.push_str("(?s:.)"),
				'\\' => {
					if let Some(escaped) = chars.next() {
						regex_str.push_str(&regex::escape(&escaped.to_string()));
					}
				}
				other => regex_str.push_str(&regex::escape(&other.to_string())),
			}
		}
		regex_str.push('$');

		let regex = RegexBuilder::new(&regex_str)
			.case_insensitive(case_insensitive)
			.build()?;
		Ok(Self {
			regex,
			source: pattern.to_string(),
			case_insensitive,
		})
	}

	/// A regular expression, either bare or in `/pattern/flags` form.
	pub fn from_regexp(pattern: &str) -> Result<Self, regex::Error> {
		let (body, flags) = match pattern.strip_prefix('/').and_then(|rest| rest.rsplit_once('/')) {
			Some((body, flags)) if flags.chars().all(|c| matches!(c, 'i' | 'm' | 'g' | 's')) => {
				(body, flags)
			}
			_ => (pattern, ""),
		};

		let case_insensitive = flags.contains('i');
		let regex = RegexBuilder::new(body)
			.case_insensitive(case_insensitive)
			.multi_line(flags.contains('m'))
			.dot_matches_new_line(flags.contains('s'))
			.build()?;
		Ok(Self {
			regex,
			source: pattern.to_string(),
			case_insensitive,
		})
	}

	pub fn is_match(&self, text: &str) -> bool {
		self.regex.is_match(text)
	}

}

impl fmt::Debug for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Pattern")
			.field("source", &self.source)
			.field("case_insensitive", &self.case_insensitive)
			.finish()
	}
}

impl PartialEq for Pattern {
	fn eq(&self, other: &Self) -> bool {
		self.regex.as_str() == other.regex.as_str() && self.case_insensitive == other.case_insensitive
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompareOp {
	Eq(Value),
	Neq(Value),
	Gt(Value),
	Gte(Value),
	Lt(Value),
	Lte(Value),
	In(Vec<Value>),
	NotIn(Vec<Value>),
	Between(Value, Value),
	Like(Pattern),
	NotLike(Pattern),
	Regexp(Pattern),
}

impl CompareOp {
	/// Tests a column value. NULL only satisfies `Eq(Null)`.
	pub fn test(&self, value: &Value) -> bool {
		match self {
			CompareOp::Eq(Value::Null) => value.is_null(),
			CompareOp::Neq(Value::Null) => !value.is_null(),
			_ if value.is_null() => false,
			CompareOp::Eq(expected) => value.matches(expected),
			CompareOp::Neq(expected) => !value.matches(expected),
			CompareOp::Gt(bound) => value.compare(bound) == Some(Ordering::Greater),
			CompareOp::Gte(bound) => {
				matches!(value.compare(bound), Some(Ordering::Greater | Ordering::Equal))
			}
			CompareOp::Lt(bound) => value.compare(bound) == Some(Ordering::Less),
			CompareOp::Lte(bound) => {
				matches!(value.compare(bound), Some(Ordering::Less | Ordering::Equal))
			}
			CompareOp::In(candidates) => candidates.iter().any(|c| value.matches(c)),
			CompareOp::NotIn(candidates) => !candidates.iter().any(|c| value.matches(c)),
			CompareOp::Between(low, high) => {
				matches!(value.compare(low), Some(Ordering::Greater | Ordering::Equal))
					&& matches!(value.compare(high), Some(Ordering::Less | Ordering::Equal))
			}
			CompareOp::Like(pattern) | CompareOp::Regexp(pattern) => {
				value.as_text().is_some_and(|text| pattern.is_match(&text))
			}
			CompareOp::NotLike(pattern) => value.as_text().is_some_and(|text| !pattern.is_match(&text)),
		}
	}
}

/// Boolean condition attached to a queryset.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	And(Vec<Predicate>),
	Or(Vec<Predicate>),
	Compare { field: ResolvedField, op: CompareOp },
}

impl Predicate {
	/// Evaluates the tree, fetching column values through `lookup`.
	///
	/// `lookup` returns `None` when the path runs through an unbound join,
	/// which compares like NULL.
	pub fn evaluate<'r, F>(&self, lookup: &F) -> bool
	where
		F: Fn(&ResolvedField) -> Option<&'r Value>,
	{
		match self {
			Predicate::And(children) => children.iter().all(|c| c.evaluate(lookup)),
			Predicate::Or(children) => children.iter().any(|c| c.evaluate(lookup)),
			Predicate::Compare { field, op } => op.test(lookup(field).unwrap_or(&Value::Null)),
		}
	}

	pub fn visit_fields<'p>(&'p self, visit: &mut impl FnMut(&'p ResolvedField)) {
		match self {
			Predicate::And(children) | Predicate::Or(children) => {
				for child in children {
					child.visit_fields(visit);
				}
			}
			Predicate::Compare { field, .. } => visit(field),
		}
	}
}
