//! Statically supplied schema descriptors.
//!
//! A [`Schema`] maps collection names to [`ModelSchema`]s. Each field carries
//! its type category and, for relations, the target collection and the
//! cardinality of the hop.

mod resolver;

pub use resolver::{FieldResolver, Hop, ResolvedField};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{FilterError, FilterResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
	Integer,
	Float,
	Text,
	Boolean,
	Date,
	DateTime,
	Json,
}

impl FieldType {
	pub fn name(self) -> &'static str {
		match self {
			FieldType::Integer => "integer",
			FieldType::Float => "float",
			FieldType::Text => "text",
			FieldType::Boolean => "boolean",
			FieldType::Date => "date",
			FieldType::DateTime => "datetime",
			FieldType::Json => "json",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
	ManyToOne,
	OneToOne,
	OneToMany,
	ManyToMany,
}

impl RelationKind {
	pub fn is_to_many(self) -> bool {
		matches!(self, RelationKind::OneToMany | RelationKind::ManyToMany)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
	pub kind: RelationKind,
	pub target: String,
	/// For one-to-many: the field on the target pointing back at this row's key.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub remote_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
	pub name: String,
	#[serde(rename = "type", default = "default_field_type")]
	pub field_type: FieldType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub relation: Option<Relation>,
}

fn default_field_type() -> FieldType {
	FieldType::Integer
}

impl FieldDescriptor {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			relation: None,
		}
	}

	/// A relation field. Its type is the type of the stored key.
	pub fn relation(name: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			field_type: FieldType::Integer,
			relation: Some(Relation {
				kind,
				target: target.into(),
				remote_field: None,
			}),
		}
	}

	pub fn with_remote_field(mut self, remote_field: impl Into<String>) -> Self {
		if let Some(relation) = self.relation.as_mut() {
			relation.remote_field = Some(remote_field.into());
		}
		self
	}

	pub fn is_relation(&self) -> bool {
		self.relation.is_some()
	}

	pub fn is_to_many(&self) -> bool {
		self.relation.as_ref().is_some_and(|r| r.kind.is_to_many())
	}

	/// Whether the field is stored as a column of its own collection.
	pub fn is_column(&self) -> bool {
		!matches!(
			self.relation.as_ref().map(|r| r.kind),
			Some(RelationKind::OneToMany)
		)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
	pub name: String,
	#[serde(default = "default_primary_key")]
	pub primary_key: String,
	pub fields: Vec<FieldDescriptor>,
}

fn default_primary_key() -> String {
	"id".to_string()
}

impl ModelSchema {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			primary_key: default_primary_key(),
			fields: Vec::new(),
		}
	}

	pub fn field(mut self, field: FieldDescriptor) -> Self {
		self.fields.push(field);
		self
	}

	pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
		self.fields.iter().find(|f| f.name == name)
	}

	pub fn primary_key_field(&self) -> Option<&FieldDescriptor> {
		self.get_field(&self.primary_key)
	}

	/// Names of the fields stored as columns, in declaration order.
	pub fn column_names(&self) -> Vec<&str> {
		self.fields
			.iter()
			.filter(|f| f.is_column())
			.map(|f| f.name.as_str())
			.collect()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
	pub models: BTreeMap<String, ModelSchema>,
}

impl Schema {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_model(&mut self, model: ModelSchema) {
		self.models.insert(model.name.clone(), model);
	}

	pub fn with_model(mut self, model: ModelSchema) -> Self {
		self.add_model(model);
		self
	}

	pub fn get_model(&self, name: &str) -> FilterResult<&ModelSchema> {
		self.models
			.get(name)
			.ok_or_else(|| FilterError::CollectionNotFound(name.to_string()))
	}

	pub fn model_names(&self) -> Vec<String> {
		self.models.keys().cloned().collect()
	}

	/// Checks that every relation points at a known collection.
	pub fn validate(&self) -> FilterResult<()> {
		for model in self.models.values() {
			if model.primary_key_field().is_none() {
				return Err(FilterError::Fixture(format!(
					"model '{}' has no primary key field '{}'",
					model.name, model.primary_key
				)));
			}
			for field in &model.fields {
				let Some(relation) = &field.relation else {
					continue;
				};
				if !self.models.contains_key(&relation.target) {
					return Err(FilterError::Fixture(format!(
						"relation '{}.{}' targets unknown model '{}'",
						model.name, field.name, relation.target
					)));
				}
				if relation.kind == RelationKind::OneToMany && relation.remote_field.is_none() {
					return Err(FilterError::Fixture(format!(
						"one-to-many relation '{}.{}' needs a remote_field",
						model.name, field.name
					)));
				}
			}
		}
		Ok(())
	}
}
