use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{MemoryStore, RowStore};
use crate::error::{FilterError, FilterResult};
use crate::query::{Row, Value};
use crate::schema::{ModelSchema, RelationKind, Schema};

#[derive(Debug, Deserialize)]
struct FixtureFile {
	models: Vec<ModelSchema>,
	#[serde(default)]
	data: BTreeMap<String, Vec<serde_json::Map<String, serde_json::Value>>>,
}

/// A schema plus the rows of every collection, loaded from one JSON document.
#[derive(Debug, Clone)]
pub struct Fixture {
	pub schema: Schema,
	pub store: MemoryStore,
}

impl Fixture {
	pub fn load<P: AsRef<Path>>(path: P) -> FilterResult<Self> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path)
			.map_err(|e| FilterError::Fixture(format!("failed to read {}: {}", path.display(), e)))?;
		Self::from_json_str(&contents)
	}

	pub fn from_json_str(contents: &str) -> FilterResult<Self> {
		let file: FixtureFile = serde_json::from_str(contents)
			.map_err(|e| FilterError::Fixture(format!("invalid fixture: {}", e)))?;

		let mut schema = Schema::new();
		for model in file.models {
			schema.add_model(model);
		}
		schema.validate()?;

		let mut store = MemoryStore::new();
		for name in schema.model_names() {
			store.create_collection(&name)?;
		}

		for (collection, records) in &file.data {
			let model = schema.get_model(collection)?;
			for record in records {
				store.insert_row(collection, typed_row(model, record)?)?;
			}
		}

		Ok(Self { schema, store })
	}
}

fn typed_row(model: &ModelSchema, record: &serde_json::Map<String, serde_json::Value>) -> FilterResult<Row> {
	let mut row = Row::new();
	for (column, json) in record {
		let value = match model.get_field(column) {
			None => Value::from_json(json),
			Some(field) => match field.relation.as_ref().map(|r| r.kind) {
				Some(RelationKind::OneToMany) => {
					return Err(FilterError::Fixture(format!(
						"'{}.{}' is a reverse relation and cannot hold data",
						model.name, column
					)));
				}
				Some(RelationKind::ManyToMany) => {
					let keys = json.as_array().ok_or_else(|| {
						FilterError::Fixture(format!(
							"'{}.{}' must be an array of keys",
							model.name, column
						))
					})?;
					let keys = keys
						.iter()
						.map(|key| coerce_column(model, column, key, field.field_type))
						.collect::<FilterResult<Vec<_>>>()?;
					Value::List(keys)
				}
				_ => coerce_column(model, column, json, field.field_type)?,
			},
		};
		row.insert(column.clone(), value);
	}
	Ok(row)
}

fn coerce_column(
	model: &ModelSchema,
	column: &str,
	json: &serde_json::Value,
	field_type: crate::schema::FieldType,
) -> FilterResult<Value> {
	Value::coerce(json, field_type).ok_or_else(|| {
		FilterError::Fixture(format!(
			"'{}.{}' expects {}, got {}",
			model.name,
			column,
			field_type.name(),
			json
		))
	})
}
