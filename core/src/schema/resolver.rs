use super::{FieldDescriptor, ModelSchema, Relation, Schema};
use crate::error::{FilterError, FilterResult};

/// One relation traversal along a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
	pub model: String,
	pub field: String,
	pub relation: Relation,
}

/// A field path resolved against the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
	/// The path as the client wrote it.
	pub path: String,
	pub hops: Vec<Hop>,
	/// Descriptor of the column the path ends on.
	pub field: FieldDescriptor,
	/// Set once any hop crosses a to-many relation.
	pub to_many: bool,
}

impl ResolvedField {
	/// Column name on the last model of the path.
	pub fn column(&self) -> &str {
		&self.field.name
	}

	/// Join key identifying the first `depth` hops, shared by every path with the same prefix.
	pub fn join_key(&self, depth: usize) -> String {
		self.hops[..depth]
			.iter()
			.map(|h| h.field.as_str())
			.collect::<Vec<_>>()
			.join(".")
	}
}

pub struct FieldResolver<'a> {
	schema: &'a Schema,
	separator: &'a str,
}

impl<'a> FieldResolver<'a> {
	pub fn new(schema: &'a Schema, separator: &'a str) -> Self {
		Self { schema, separator }
	}

	pub fn resolve(&self, model: &str, path: &str) -> FilterResult<ResolvedField> {
		let mut current: &ModelSchema = self.schema.get_model(model)?;
		let segments: Vec<&str> = path.split(self.separator).collect();
		let mut hops = Vec::new();
		let mut to_many = false;

		for (i, segment) in segments.iter().enumerate() {
			let is_last = i + 1 == segments.len();
			let field = current
				.get_field(segment)
				.ok_or_else(|| FilterError::unknown_field(path, &current.name))?;

			let Some(relation) = &field.relation else {
				if is_last {
					return Ok(ResolvedField {
						path: path.to_string(),
						hops,
						field: field.clone(),
						to_many,
					});
				}
				// A plain column cannot be traversed
				return Err(FilterError::unknown_field(path, &current.name));
			};

			to_many |= relation.kind.is_to_many();
			hops.push(Hop {
				model: current.name.clone(),
				field: field.name.clone(),
				relation: relation.clone(),
			});
			current = self.schema.get_model(&relation.target)?;
		}

		// Path ends on a relation: compare against the related primary key
		let key = current
			.primary_key_field()
			.ok_or_else(|| FilterError::unknown_field(path, &current.name))?;
		Ok(ResolvedField {
			path: path.to_string(),
			hops,
			field: key.clone(),
			to_many,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::{FieldType, RelationKind};

	fn blog_schema() -> Schema {
		Schema::new()
			.with_model(
				ModelSchema::new("post")
					.field(FieldDescriptor::new("id", FieldType::Integer))
					.field(FieldDescriptor::new("title", FieldType::Text))
					.field(FieldDescriptor::relation("author", RelationKind::ManyToOne, "person"))
					.field(FieldDescriptor::relation("tags", RelationKind::ManyToMany, "tag")),
			)
			.with_model(
				ModelSchema::new("person")
					.field(FieldDescriptor::new("id", FieldType::Integer))
					.field(FieldDescriptor::new("name", FieldType::Text))
					.field(
						FieldDescriptor::relation("posts", RelationKind::OneToMany, "post")
							.with_remote_field("author"),
					),
			)
			.with_model(
				ModelSchema::new("tag")
					.field(FieldDescriptor::new("id", FieldType::Integer))
					.field(FieldDescriptor::new("name", FieldType::Text)),
			)
	}

	#[test]
	fn test_plain_field() {
		let schema = blog_schema();
		let resolved = FieldResolver::new(&schema, ".").resolve("post", "title").unwrap();
		assert!(resolved.hops.is_empty());
		assert!(!resolved.to_many);
		assert_eq!(resolved.column(), "title");
	}

	#[test]
	fn test_to_one_hop_is_not_to_many() {
		let schema = blog_schema();
		let resolved = FieldResolver::new(&schema, ".")
			.resolve("post", "author.name")
			.unwrap();
		assert_eq!(resolved.hops.len(), 1);
		assert!(!resolved.to_many);
		assert_eq!(resolved.join_key(1), "author");
	}

	#[test]
	fn test_to_many_flag_sticks_across_later_hops() {
		let schema = blog_schema();
		let resolved = FieldResolver::new(&schema, ".")
			.resolve("person", "posts.author.name")
			.unwrap();
		assert!(resolved.to_many);
		assert_eq!(resolved.join_key(2), "posts.author");
	}

	#[test]
	fn test_relation_leaf_resolves_to_primary_key() {
		let schema = blog_schema();
		let resolved = FieldResolver::new(&schema, ".").resolve("post", "tags").unwrap();
		assert!(resolved.to_many);
		assert_eq!(resolved.column(), "id");
	}

	#[test]
	fn test_custom_separator() {
		let schema = blog_schema();
		let resolved = FieldResolver::new(&schema, "__")
			.resolve("post", "tags__name")
			.unwrap();
		assert_eq!(resolved.column(), "name");
	}

	#[test]
	fn test_unknown_segments() {
		let schema = blog_schema();
		let resolver = FieldResolver::new(&schema, ".");
		assert_eq!(
			resolver.resolve("post", "body"),
			Err(FilterError::unknown_field("body", "post"))
		);
		assert_eq!(
			resolver.resolve("post", "author.age"),
			Err(FilterError::unknown_field("author.age", "person"))
		);
		assert_eq!(
			resolver.resolve("post", "title.length"),
			Err(FilterError::unknown_field("title.length", "post"))
		);
	}
}
