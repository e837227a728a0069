use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::{Direction, OrderBy, QuerySet, Row, Value};
use crate::error::FilterResult;
use crate::schema::{Hop, ModelSchema, RelationKind, ResolvedField, Schema};
use crate::storage::RowStore;

/// A root row together with one binding per joined relation path.
///
/// An unbound join (`None`) stands for the NULL side of a left join.
#[derive(Debug, Clone)]
struct JoinedRow {
	root: Rc<Row>,
	joins: HashMap<String, Option<Rc<Row>>>,
}

impl JoinedRow {
	fn lookup(&self, field: &ResolvedField) -> Option<&Value> {
		if field.hops.is_empty() {
			return Some(self.root.value(field.column()));
		}
		let bound = self.joins.get(&field.join_key(field.hops.len()))?.as_ref()?;
		Some(bound.value(field.column()))
	}
}

struct JoinSpec<'q> {
	parent: String,
	hop: &'q Hop,
}

/// Runs [`QuerySet`] descriptions against a [`RowStore`].
///
/// Each relation hop referenced by a predicate or the ordering becomes a left
/// join that yields one row per related row, the way a relational store
/// would. A parent with several matching children therefore comes back
/// several times.
pub struct Executor<'a> {
	schema: &'a Schema,
	store: &'a dyn RowStore,
	scans: RefCell<HashMap<String, Rc<Vec<Rc<Row>>>>>,
}

impl<'a> Executor<'a> {
	pub fn new(schema: &'a Schema, store: &'a dyn RowStore) -> Self {
		Self {
			schema,
			store,
			scans: RefCell::new(HashMap::new()),
		}
	}

	pub fn schema(&self) -> &'a Schema {
		self.schema
	}

	/// Materializes the queryset.
	pub fn fetch(&self, queryset: &QuerySet) -> FilterResult<Vec<Row>> {
		let model = self.schema.get_model(queryset.model())?;
		let rows = self.execute(queryset)?;

		rows.iter()
			.map(|joined| self.shape_output(model, queryset, &joined.root))
			.collect()
	}

	/// Materializes a single column of the queryset, one value per joined row.
	pub fn values_list(&self, queryset: &QuerySet, column: &str) -> FilterResult<Vec<Value>> {
		let rows = self.execute(queryset)?;
		Ok(rows.iter().map(|joined| joined.root.value(column).clone()).collect())
	}

	fn execute(&self, queryset: &QuerySet) -> FilterResult<Vec<JoinedRow>> {
		let model = self.schema.get_model(queryset.model())?;
		let mut base: Vec<Rc<Row>> = self.scan(&model.name)?.iter().cloned().collect();

		if let Some(keys) = queryset.key_filter() {
			base.retain(|row| keys.contains(row.value(&model.primary_key)));
		}

		let joins = Self::plan_joins(queryset);
		let mut rows = Vec::with_capacity(base.len());
		for root in base {
			rows.extend(self.expand(root, &joins)?);
		}
		tracing::trace!(
			collection = %model.name,
			joins = joins.len(),
			rows = rows.len(),
			"expanded joins"
		);

		rows.retain(|joined| {
			queryset
				.predicates()
				.iter()
				.all(|p| p.evaluate(&|field: &ResolvedField| joined.lookup(field)))
		});

		match queryset.ordering() {
			Some(OrderBy::Field { field, direction }) => {
				rows.sort_by(|a, b| {
					let left = a.lookup(field).unwrap_or(&Value::Null);
					let right = b.lookup(field).unwrap_or(&Value::Null);
					match direction {
						Direction::Ascending => left.sort_cmp(right),
						Direction::Descending => right.sort_cmp(left),
					}
				});
			}
			Some(OrderBy::Rank(ranks)) => {
				rows.sort_by_key(|joined| {
					ranks
						.get(joined.root.value(&model.primary_key))
						.copied()
						.unwrap_or(usize::MAX)
				});
			}
			None => {}
		}

		let limit = queryset.limit().unwrap_or(usize::MAX);
		Ok(rows.into_iter().skip(queryset.offset()).take(limit).collect())
	}

	/// Distinct join paths, parents ordered before their children.
	fn plan_joins(queryset: &QuerySet) -> BTreeMap<String, JoinSpec<'_>> {
		let mut joins = BTreeMap::new();
		for field in queryset.referenced_fields() {
			for depth in 1..=field.hops.len() {
				joins.entry(field.join_key(depth)).or_insert_with(|| JoinSpec {
					parent: field.join_key(depth - 1),
					hop: &field.hops[depth - 1],
				});
			}
		}
		joins
	}

	fn expand(&self, root: Rc<Row>, joins: &BTreeMap<String, JoinSpec<'_>>) -> FilterResult<Vec<JoinedRow>> {
		let mut rows = vec![JoinedRow {
			root,
			joins: HashMap::new(),
		}];

		for (key, spec) in joins {
			let mut next = Vec::with_capacity(rows.len());
			for joined in rows {
				let parent = if spec.parent.is_empty() {
					Some(Rc::clone(&joined.root))
				} else {
					joined.joins.get(&spec.parent).cloned().flatten()
				};
				let related = match parent {
					Some(parent) => self.related(spec.hop, &parent)?,
					None => Vec::new(),
				};

				if related.is_empty() {
					let mut unbound = joined;
					unbound.joins.insert(key.clone(), None);
					next.push(unbound);
				} else {
					for row in related {
						let mut bound = joined.clone();
						bound.joins.insert(key.clone(), Some(row));
						next.push(bound);
					}
				}
			}
			rows = next;
		}

		Ok(rows)
	}

	/// Rows on the far side of `hop`, in storage order (or key order for many-to-many).
	fn related(&self, hop: &Hop, parent: &Row) -> FilterResult<Vec<Rc<Row>>> {
		let source = self.schema.get_model(&hop.model)?;
		let target = self.schema.get_model(&hop.relation.target)?;
		let rows = self.scan(&target.name)?;
		let by_key = |key: &Value| {
			rows.iter()
				.find(|row| row.value(&target.primary_key).matches(key))
				.cloned()
		};

		let related = match hop.relation.kind {
			RelationKind::ManyToOne | RelationKind::OneToOne => match parent.value(&hop.field) {
				Value::Null => Vec::new(),
				key => by_key(key).into_iter().collect(),
			},
			RelationKind::ManyToMany => match parent.value(&hop.field) {
				Value::Null => Vec::new(),
				Value::List(keys) => keys.iter().filter_map(by_key).collect(),
				key => by_key(key).into_iter().collect(),
			},
			RelationKind::OneToMany => {
				let key = parent.value(&source.primary_key);
				let remote = hop.relation.remote_field.as_deref().unwrap_or_default();
				rows.iter()
					.filter(|row| !key.is_null() && row.value(remote).matches(key))
					.cloned()
					.collect()
			}
		};
		Ok(related)
	}

	fn scan(&self, collection: &str) -> FilterResult<Rc<Vec<Rc<Row>>>> {
		if let Some(rows) = self.scans.borrow().get(collection) {
			return Ok(Rc::clone(rows));
		}

		let rows: Rc<Vec<Rc<Row>>> = Rc::new(self.store.scan(collection)?.into_iter().map(Rc::new).collect());
		self.scans
			.borrow_mut()
			.insert(collection.to_string(), Rc::clone(&rows));
		Ok(rows)
	}

	fn shape_output(&self, model: &ModelSchema, queryset: &QuerySet, root: &Row) -> FilterResult<Row> {
		let mut output = match queryset.projection() {
			Some(columns) => columns
				.iter()
				.filter_map(|c| root.get(c).map(|v| (c.clone(), v.clone())))
				.collect(),
			None => root.clone(),
		};

		for relation in queryset.includes() {
			let Some(field) = model.get_field(relation) else {
				continue;
			};
			let Some(rel) = &field.relation else {
				continue;
			};
			let hop = Hop {
				model: model.name.clone(),
				field: field.name.clone(),
				relation: rel.clone(),
			};
			let related = self.related(&hop, root)?;
			let embedded = if rel.kind.is_to_many() {
				Value::List(related.iter().map(|r| Value::Object(r.data.clone())).collect())
			} else {
				related
					.first()
					.map_or(Value::Null, |r| Value::Object(r.data.clone()))
			};
			output.insert(relation.clone(), embedded);
		}

		Ok(output)
	}
}
