use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::schema::FieldType;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone)]
pub enum Value {
	Integer(i64),
	Float(f64),
	String(String),
	Boolean(bool),
	Null,
	Date(NaiveDate),
	DateTime(NaiveDateTime),
	List(Vec<Value>),
	Object(BTreeMap<String, Value>),
}

impl Value {
	/// Untyped conversion: numbers, strings and containers map one to one.
	pub fn from_json(json: &serde_json::Value) -> Self {
		match json {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(b) => Value::Boolean(*b),
			serde_json::Value::Number(n) => match n.as_i64() {
				Some(i) => Value::Integer(i),
				None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
			},
			serde_json::Value::String(s) => Value::String(s.clone()),
			serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
			serde_json::Value::Object(map) => Value::Object(
				map.iter()
					.map(|(k, v)| (k.clone(), Value::from_json(v)))
					.collect(),
			),
		}
	}

	/// Converts a JSON scalar into the representation of `field_type`.
	///
	/// Returns `None` when the JSON value cannot represent that type. `null` is
	/// accepted for every type.
	pub fn coerce(json: &serde_json::Value, field_type: FieldType) -> Option<Self> {
		use serde_json::Value as Json;

		if json.is_null() {
			return Some(Value::Null);
		}

		match field_type {
			FieldType::Integer => match json {
				Json::Number(n) => n
					.as_i64()
					.or_else(|| n.as_f64().and_then(integral_f64))
					.map(Value::Integer),
				Json::String(s) => s.trim().parse::<i64>().ok().map(Value::Integer),
				_ => None,
			},
			FieldType::Float => match json {
				Json::Number(n) => n.as_f64().map(Value::Float),
				Json::String(s) => s.trim().parse::<f64>().ok().map(Value::Float),
				_ => None,
			},
			FieldType::Boolean => match json {
				Json::Bool(b) => Some(Value::Boolean(*b)),
				Json::String(s) if s == "true" => Some(Value::Boolean(true)),
				Json::String(s) if s == "false" => Some(Value::Boolean(false)),
				_ => None,
			},
			FieldType::Text => match json {
				Json::String(s) => Some(Value::String(s.clone())),
				Json::Number(n) => Some(Value::String(n.to_string())),
				Json::Bool(b) => Some(Value::String(b.to_string())),
				_ => None,
			},
			FieldType::Date => json.as_str().and_then(parse_date).map(Value::Date),
			FieldType::DateTime => json.as_str().and_then(parse_datetime).map(Value::DateTime),
			FieldType::Json => Some(Value::from_json(json)),
		}
	}

	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Value::Integer(i) => serde_json::Value::from(*i),
			Value::Float(f) => serde_json::Value::from(*f),
			Value::String(s) => serde_json::Value::String(s.clone()),
			Value::Boolean(b) => serde_json::Value::Bool(*b),
			Value::Null => serde_json::Value::Null,
			Value::Date(d) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
			Value::DateTime(dt) => serde_json::Value::String(dt.format(DATETIME_FORMAT).to_string()),
			Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
			Value::Object(map) => serde_json::Value::Object(
				map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
			),
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Text used by pattern operators (`like`, `regexp`).
	pub fn as_text(&self) -> Option<String> {
		match self {
			Value::Null | Value::List(_) | Value::Object(_) => None,
			Value::String(s) => Some(s.clone()),
			other => match other.to_json() {
				serde_json::Value::String(s) => Some(s),
				json => Some(json.to_string()),
			},
		}
	}

	fn kind_rank(&self) -> u8 {
		match self {
			Value::Null => 0,
			Value::Boolean(_) => 1,
			Value::Integer(_) | Value::Float(_) => 2,
			Value::String(_) => 3,
			Value::Date(_) => 4,
			Value::DateTime(_) => 5,
			Value::List(_) => 6,
			Value::Object(_) => 7,
		}
	}

	/// Total order used for sorting. NULL sorts first; mismatched kinds order by
	/// kind, lists element by element under this same order.
	pub fn sort_cmp(&self, other: &Value) -> Ordering {
		match (self, other) {
			(Value::List(l), Value::List(r)) => l
				.iter()
				.zip(r)
				.map(|(a, b)| a.sort_cmp(b))
				.find(|ord| ord.is_ne())
				.unwrap_or_else(|| l.len().cmp(&r.len())),
			_ => self
				.compare(other)
				.unwrap_or_else(|| self.kind_rank().cmp(&other.kind_rank())),
		}
	}

	/// Comparison between values of compatible kinds, `None` otherwise.
	pub fn compare(&self, other: &Value) -> Option<Ordering> {
		match (self, other) {
			(Value::Null, Value::Null) => Some(Ordering::Equal),
			(Value::Integer(l), Value::Integer(r)) => Some(l.cmp(r)),
			(Value::Float(l), Value::Float(r)) => Some(l.total_cmp(r)),
			(Value::Integer(l), Value::Float(r)) => Some((*l as f64).total_cmp(r)),
			(Value::Float(l), Value::Integer(r)) => Some(l.total_cmp(&(*r as f64))),
			(Value::String(l), Value::String(r)) => Some(l.cmp(r)),
			(Value::Boolean(l), Value::Boolean(r)) => Some(l.cmp(r)),
			(Value::Date(l), Value::Date(r)) => Some(l.cmp(r)),
			(Value::DateTime(l), Value::DateTime(r)) => Some(l.cmp(r)),
			(Value::Date(l), Value::DateTime(r)) => l.and_hms_opt(0, 0, 0).map(|l| l.cmp(r)),
			(Value::DateTime(l), Value::Date(r)) => r.and_hms_opt(0, 0, 0).map(|r| l.cmp(&r)),
			(Value::List(l), Value::List(r)) => {
				for (a, b) in l.iter().zip(r) {
					match a.compare(b)? {
						Ordering::Equal => continue,
						ord => return Some(ord),
					}
				}
				Some(l.len().cmp(&r.len()))
			}
			_ => None,
		}
	}

	/// Equality as a predicate sees it: numeric kinds compare by value.
	pub fn matches(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Object(l), Value::Object(r)) => l == r,
			_ => self.compare(other) == Some(Ordering::Equal),
		}
	}
}

/// A whole float inside the `i64` range. `as` would saturate anything larger.
fn integral_f64(f: f64) -> Option<i64> {
	const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
	(f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}

// Identity equality, used for primary keys and key sets. Floats compare by bits.
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Integer(l), Value::Integer(r)) => l == r,
			(Value::Float(l), Value::Float(r)) => l.to_bits() == r.to_bits(),
			(Value::String(l), Value::String(r)) => l == r,
			(Value::Boolean(l), Value::Boolean(r)) => l == r,
			(Value::Null, Value::Null) => true,
			(Value::Date(l), Value::Date(r)) => l == r,
			(Value::DateTime(l), Value::DateTime(r)) => l == r,
			(Value::List(l), Value::List(r)) => l == r,
			(Value::Object(l), Value::Object(r)) => l == r,
			_ => false,
		}
	}
}

impl Eq for Value {}

impl Hash for Value {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.kind_rank().hash(state);
		match self {
			Value::Integer(i) => i.hash(state),
			Value::Float(f) => f.to_bits().hash(state),
			Value::String(s) => s.hash(state),
			Value::Boolean(b) => b.hash(state),
			Value::Null => {}
			Value::Date(d) => d.hash(state),
			Value::DateTime(dt) => dt.hash(state),
			Value::List(items) => items.hash(state),
			Value::Object(map) => map.hash(state),
		}
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Integer(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::String(value.to_string())
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Boolean(value)
	}
}

fn parse_date(s: &str) -> Option<NaiveDate> {
	// Accept full timestamps too ("2024-01-15T10:30:00Z")
	let date_part = s.split('T').next().unwrap_or(s);
	NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
	if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
		return Some(dt.naive_utc());
	}
	NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
		.ok()
		.or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
		.or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// One record of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
	pub data: BTreeMap<String, Value>,
}

impl Row {
	pub fn new() -> Self {
		Self {
			data: BTreeMap::new(),
		}
	}

	pub fn insert(&mut self, column: impl Into<String>, value: Value) {
		self.data.insert(column.into(), value);
	}

	pub fn get(&self, column: &str) -> Option<&Value> {
		self.data.get(column)
	}

	/// Column value, treating a missing column as NULL.
	pub fn value(&self, column: &str) -> &Value {
		self.data.get(column).unwrap_or(&Value::Null)
	}

	pub fn to_json(&self) -> serde_json::Value {
		serde_json::Value::Object(
			self.data
				.iter()
				.map(|(k, v)| (k.clone(), v.to_json()))
				.collect(),
		)
	}
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
	fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
		Self {
			data: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_coerce_numeric_strings() {
		assert_eq!(
			Value::coerce(&json!("42"), FieldType::Integer),
			Some(Value::Integer(42))
		);
		assert_eq!(Value::coerce(&json!("4x"), FieldType::Integer), None);
		assert_eq!(
			Value::coerce(&json!(2.5), FieldType::Float),
			Some(Value::Float(2.5))
		);
		assert_eq!(Value::coerce(&json!(2.5), FieldType::Integer), None);
		assert_eq!(
			Value::coerce(&json!(4.0), FieldType::Integer),
			Some(Value::Integer(4))
		);
	}

	#[test]
	fn test_coerce_rejects_floats_beyond_i64() {
		assert_eq!(Value::coerce(&json!(1e20), FieldType::Integer), None);
		assert_eq!(Value::coerce(&json!(-1e19), FieldType::Integer), None);
		assert_eq!(
			Value::coerce(&json!(-9.0e18), FieldType::Integer),
			Some(Value::Integer(-9_000_000_000_000_000_000))
		);
	}

	#[test]
	fn test_lists_with_mixed_elements_sort_totally() {
		let list = |items: Vec<Value>| Value::List(items);
		let one = list(vec![Value::Integer(1)]);
		let two = list(vec![Value::Integer(2)]);
		let text = list(vec![Value::from("a")]);

		assert_eq!(one.sort_cmp(&text), Ordering::Less);
		assert_eq!(text.sort_cmp(&two), Ordering::Greater);
		assert_eq!(one.compare(&text), None);

		let mut values = vec![text.clone(), two.clone(), list(vec![]), one.clone()];
		values.sort_by(|a, b| a.sort_cmp(b));
		assert_eq!(values, vec![list(vec![]), one, two, text]);
	}

	#[test]
	fn test_coerce_dates() {
		let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
		assert_eq!(
			Value::coerce(&json!("2024-06-15"), FieldType::Date),
			Some(Value::Date(date))
		);
		assert_eq!(
			Value::coerce(&json!("2024-06-15T10:30:00Z"), FieldType::DateTime),
			Some(Value::DateTime(date.and_hms_opt(10, 30, 0).unwrap()))
		);
		assert_eq!(Value::coerce(&json!("June"), FieldType::Date), None);
	}

	#[test]
	fn test_null_sorts_first() {
		let mut values = vec![Value::Integer(3), Value::Null, Value::Float(1.5)];
		values.sort_by(|a, b| a.sort_cmp(b));
		assert_eq!(values, vec![Value::Null, Value::Float(1.5), Value::Integer(3)]);
	}

	#[test]
	fn test_numeric_match_across_kinds() {
		assert!(Value::Integer(2).matches(&Value::Float(2.0)));
		assert!(!Value::Integer(2).matches(&Value::String("2".to_string())));
		assert_ne!(Value::Integer(2), Value::Float(2.0));
	}

	#[test]
	fn test_json_round_trip_for_dates() {
		let value = Value::Date(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
		assert_eq!(value.to_json(), json!("2023-01-02"));
		assert_eq!(value.as_text().as_deref(), Some("2023-01-02"));
	}
}
