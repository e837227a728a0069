use serde_json::Value as Json;

use crate::error::{FilterError, FilterResult};
use crate::query::QuerySet;
use crate::schema::ModelSchema;

/// The `fields` stage: restricts the output columns.
///
/// An array (or a single name) lists the columns to keep. An object maps
/// names to booleans: when any is `true` only those columns are kept,
/// otherwise every column except the `false` ones is kept.
#[derive(Debug, Clone)]
pub struct FieldsFilter {
	columns: Vec<String>,
}

impl FieldsFilter {
	pub fn new(model: &ModelSchema, fields: &Json) -> FilterResult<Self> {
		let columns = match fields {
			Json::String(name) => vec![name.clone()],
			Json::Array(names) => names
				.iter()
				.map(|name| {
					name.as_str()
						.map(str::to_string)
						.ok_or_else(|| FilterError::invalid_type("fields", "array of strings", name))
				})
				.collect::<FilterResult<Vec<_>>>()?,
			Json::Object(flags) => {
				let mut selected = Vec::new();
				let mut excluded = Vec::new();
				for (name, flag) in flags {
					match flag.as_bool() {
						Some(true) => selected.push(name.clone()),
						Some(false) => excluded.push(name.clone()),
						None => return Err(FilterError::invalid_type("fields", "boolean flags", flag)),
					}
				}
				for name in selected.iter().chain(&excluded) {
					Self::check_column(model, name)?;
				}
				if selected.is_empty() {
					model
						.column_names()
						.into_iter()
						.filter(|c| !excluded.iter().any(|e| e == c))
						.map(str::to_string)
						.collect()
				} else {
					selected
				}
			}
			other => return Err(FilterError::invalid_type("fields", "object or array", other)),
		};

		for name in &columns {
			Self::check_column(model, name)?;
		}
		Ok(Self { columns })
	}

	fn check_column(model: &ModelSchema, name: &str) -> FilterResult<()> {
		match model.get_field(name) {
			Some(field) if field.is_column() => Ok(()),
			_ => Err(FilterError::unknown_field(name, &model.name)),
		}
	}

	pub fn columns(&self) -> &[String] {
		&self.columns
	}

	pub fn filter_queryset(self, queryset: QuerySet) -> QuerySet {
		queryset.only(self.columns)
	}
}

/// The `include` stage: embeds related rows of the named relations.
#[derive(Debug, Clone)]
pub struct IncludeFilter {
	relations: Vec<String>,
}

impl IncludeFilter {
	pub fn new(model: &ModelSchema, include: &Json) -> FilterResult<Self> {
		let names: Vec<&Json> = match include {
			Json::String(_) => vec![include],
			Json::Array(items) => items.iter().collect(),
			other => return Err(FilterError::invalid_type("include", "string or array", other)),
		};

		let mut relations = Vec::with_capacity(names.len());
		for name in names {
			let name = name
				.as_str()
				.ok_or_else(|| FilterError::invalid_type("include", "array of strings", name))?;
			match model.get_field(name) {
				Some(field) if field.is_relation() => relations.push(name.to_string()),
				_ => return Err(FilterError::unknown_field(name, &model.name)),
			}
		}
		Ok(Self { relations })
	}

	pub fn filter_queryset(self, queryset: QuerySet) -> QuerySet {
		self.relations
			.into_iter()
			.fold(queryset, |qs, relation| qs.include(relation))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_fixtures;
	use serde_json::json;

	fn person() -> ModelSchema {
		test_fixtures::schema().get_model("person").unwrap().clone()
	}

	fn columns(fields: Json) -> FilterResult<Vec<String>> {
		FieldsFilter::new(&person(), &fields).map(|f| f.columns().to_vec())
	}

	#[test]
	fn test_array_selects_columns() {
		assert_eq!(columns(json!(["name", "age"])).unwrap(), vec!["name", "age"]);
		assert_eq!(columns(json!("name")).unwrap(), vec!["name"]);
	}

	#[test]
	fn test_true_flags_select() {
		let mut selected = columns(json!({"name": true, "age": true, "status": false})).unwrap();
		selected.sort();
		assert_eq!(selected, vec!["age", "name"]);
	}

	#[test]
	fn test_false_flags_exclude() {
		let kept = columns(json!({"joined": false, "team": false})).unwrap();
		assert_eq!(kept, vec!["id", "name", "age", "status", "type"]);
	}

	#[test]
	fn test_unknown_or_reverse_field_is_rejected() {
		for fields in [json!(["nickname"]), json!({"posts": true}), json!({"nickname": false})] {
			assert!(
				matches!(columns(fields.clone()), Err(FilterError::UnknownField { .. })),
				"{}",
				fields
			);
		}
	}

	#[test]
	fn test_invalid_fields_shape() {
		assert!(matches!(
			columns(json!(7)),
			Err(FilterError::InvalidConditionType { .. })
		));
		assert!(matches!(
			columns(json!({"name": "yes"})),
			Err(FilterError::InvalidConditionType { .. })
		));
	}

	#[test]
	fn test_include_accepts_relations_only() {
		let model = person();
		let qs = IncludeFilter::new(&model, &json!(["team", "posts"]))
			.unwrap()
			.filter_queryset(QuerySet::new("person"));
		assert_eq!(qs.includes(), ["team", "posts"]);

		assert!(matches!(
			IncludeFilter::new(&model, &json!("name")),
			Err(FilterError::UnknownField { .. })
		));
		assert!(matches!(
			IncludeFilter::new(&model, &json!({"team": true})),
			Err(FilterError::InvalidConditionType { .. })
		));
	}
}
