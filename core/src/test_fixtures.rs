//! Shared schema and rows for unit tests.

use crate::query::{Row, Value};
use crate::schema::{FieldDescriptor, FieldType, ModelSchema, RelationKind, Schema};
use crate::storage::{MemoryStore, RowStore};

pub const NAMES: [&str; 25] = [
	"Yara", "Bruno", "Quinn", "Hana", "Ezra", "Mila", "Arlo", "Wren", "Cyrus", "Nia", "Felix", "Oona",
	"Dario", "Lena", "Igor", "Pia", "Gus", "Tess", "Kai", "Vera", "Jude", "Rosa", "Sami", "Xeno",
	"Uma",
];

pub fn schema() -> Schema {
	Schema::new()
		.with_model(
			ModelSchema::new("person")
				.field(FieldDescriptor::new("id", FieldType::Integer))
				.field(FieldDescriptor::new("name", FieldType::Text))
				.field(FieldDescriptor::new("age", FieldType::Integer))
				.field(FieldDescriptor::new("status", FieldType::Text))
				.field(FieldDescriptor::new("type", FieldType::Text))
				.field(FieldDescriptor::new("joined", FieldType::Date))
				.field(FieldDescriptor::relation("team", RelationKind::ManyToOne, "team"))
				.field(
					FieldDescriptor::relation("posts", RelationKind::OneToMany, "post")
						.with_remote_field("author"),
				),
		)
		.with_model(
			ModelSchema::new("team")
				.field(FieldDescriptor::new("id", FieldType::Integer))
				.field(FieldDescriptor::new("name", FieldType::Text)),
		)
		.with_model(
			ModelSchema::new("post")
				.field(FieldDescriptor::new("id", FieldType::Integer))
				.field(FieldDescriptor::new("title", FieldType::Text))
				.field(FieldDescriptor::new("score", FieldType::Float))
				.field(FieldDescriptor::relation("author", RelationKind::ManyToOne, "person"))
				.field(FieldDescriptor::relation("tags", RelationKind::ManyToMany, "tag")),
		)
		.with_model(
			ModelSchema::new("tag")
				.field(FieldDescriptor::new("id", FieldType::Integer))
				.field(FieldDescriptor::new("name", FieldType::Text)),
		)
}

/// 25 people (ids 1-25); the first five are under 18. Status alternates
/// active/inactive starting with active, type cycles A/B/C.
pub fn store() -> MemoryStore {
	let mut store = MemoryStore::new();
	for name in ["person", "team", "post", "tag"] {
		store.create_collection(name).unwrap();
	}

	for (i, name) in NAMES.iter().enumerate() {
		let id = i as i64 + 1;
		let age = if i < 5 { 10 + i as i64 } else { 14 + i as i64 };
		let row: Row = [
			("id", Value::Integer(id)),
			("name", Value::from(*name)),
			("age", Value::Integer(age)),
			("status", Value::from(if i % 2 == 0 { "active" } else { "inactive" })),
			("type", Value::from(["A", "B", "C"][i % 3])),
			(
				"joined",
				Value::Date(chrono::NaiveDate::from_ymd_opt(2020, 1, 1 + i as u32).unwrap()),
			),
			(
				"team",
				if i < 3 { Value::Integer(i as i64 % 2 + 1) } else { Value::Null },
			),
		]
		.into_iter()
		.collect();
		store.insert_row("person", row).unwrap();
	}

	for (id, name) in [(1, "Core"), (2, "Edge")] {
		let row: Row = [("id", Value::Integer(id)), ("name", Value::from(name))]
			.into_iter()
			.collect();
		store.insert_row("team", row).unwrap();
	}

	for (id, name) in [(1, "rust"), (2, "databases"), (3, "performance")] {
		let row: Row = [("id", Value::Integer(id)), ("name", Value::from(name))]
			.into_iter()
			.collect();
		store.insert_row("tag", row).unwrap();
	}

	let posts: [(i64, &str, f64, i64, &[i64]); 4] = [
		(1, "Rust ownership", 4.5, 1, &[1, 2]),
		(2, "Query planning", 3.0, 2, &[2, 3]),
		(3, "Joins considered", 4.0, 1, &[3]),
		(4, "Untagged", 1.0, 3, &[]),
	];
	for (id, title, score, author, tags) in posts {
		let row: Row = [
			("id", Value::Integer(id)),
			("title", Value::from(title)),
			("score", Value::Float(score)),
			("author", Value::Integer(author)),
			(
				"tags",
				Value::List(tags.iter().map(|t| Value::Integer(*t)).collect()),
			),
		]
		.into_iter()
		.collect();
		store.insert_row("post", row).unwrap();
	}

	store
}

pub fn ids(rows: &[Row]) -> Vec<i64> {
	rows.iter()
		.map(|row| match row.value("id") {
			Value::Integer(id) => *id,
			other => panic!("row without integer id: {:?}", other),
		})
		.collect()
}
