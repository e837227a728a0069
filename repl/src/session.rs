use std::path::Path;

use lbquery_core::{Config, FilterError, Fixture, LoopbackFilterBackend, QueryParams, QuerySet, Row};

const KEYS: [&str; 2] = ["filter", "where"];

/// A loaded fixture plus the collection queries run against.
pub struct Session {
	fixture: Fixture,
	config: Config,
	collection: Option<String>,
}

#[derive(Debug)]
pub enum SessionError {
	NoCollection,
	Filter(FilterError),
}

impl std::fmt::Display for SessionError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			SessionError::NoCollection => write!(f, "No collection selected. Use .use <name>"),
			SessionError::Filter(e) => write!(f, "[{}] {}", e.kind().status_code(), e),
		}
	}
}

impl From<FilterError> for SessionError {
	fn from(e: FilterError) -> Self {
		SessionError::Filter(e)
	}
}

impl Session {
	pub fn new(fixture: Fixture, config: Config) -> Self {
		// A lone collection is selected up front
		let names = fixture.schema.model_names();
		let collection = if names.len() == 1 { names.into_iter().next() } else { None };
		Self {
			fixture,
			config,
			collection,
		}
	}

	pub fn load<P: AsRef<Path>>(path: P, config: Config) -> Result<Self, FilterError> {
		Ok(Self::new(Fixture::load(path)?, config))
	}

	pub fn fixture(&self) -> &Fixture {
		&self.fixture
	}

	pub fn collection(&self) -> Option<&str> {
		self.collection.as_deref()
	}

	pub fn use_collection(&mut self, name: &str) -> Result<(), FilterError> {
		self.fixture.schema.get_model(name)?;
		self.collection = Some(name.to_string());
		Ok(())
	}

	/// Field names of the current collection, for completion.
	pub fn field_names(&self) -> Vec<String> {
		self.collection
			.as_deref()
			.and_then(|name| self.fixture.schema.get_model(name).ok())
			.map(|model| model.fields.iter().map(|f| f.name.clone()).collect())
			.unwrap_or_default()
	}

	pub fn evaluate(&self, input: &str) -> Result<Vec<Row>, SessionError> {
		let collection = self.collection.as_deref().ok_or(SessionError::NoCollection)?;
		let params = parse_input(input);
		let backend = LoopbackFilterBackend::new(&self.fixture.schema, &self.fixture.store)
			.with_config(self.config.filter.clone());
		Ok(backend.fetch(&params, QuerySet::new(collection))?)
	}
}

/// Reads `filter=<json>`, `where=<json>` (joined by `&`) or a bare JSON filter.
pub fn parse_input(input: &str) -> QueryParams {
	let input = input.trim();
	if !KEYS.iter().any(|key| input.starts_with(&format!("{key}="))) {
		return QueryParams::new().with("filter", input);
	}

	let mut params = QueryParams::new();
	let mut current: Option<(&str, String)> = None;
	for piece in input.split('&') {
		if let Some(key) = KEYS.iter().copied().find(|key| piece.starts_with(&format!("{key}="))) {
			if let Some((k, v)) = current.take() {
				params.insert(k, v);
			}
			current = Some((key, piece[key.len() + 1..].to_string()));
		} else if let Some((_, value)) = current.as_mut() {
			// An `&` inside the JSON value
			value.push('&');
			value.push_str(piece);
		}
	}
	if let Some((k, v)) = current {
		params.insert(k, v);
	}
	params
}

#[cfg(test)]
mod tests {
	use super::*;

	const FIXTURE: &str = r#"{
		"models": [
			{"name": "person", "fields": [
				{"name": "id", "type": "integer"},
				{"name": "name", "type": "text"},
				{"name": "age", "type": "integer"}
			]}
		],
		"data": {
			"person": [
				{"id": 1, "name": "Ada", "age": 36},
				{"id": 2, "name": "Brian", "age": 17},
				{"id": 3, "name": "Cleo", "age": 52}
			]
		}
	}"#;

	fn session() -> Session {
		Session::new(Fixture::from_json_str(FIXTURE).unwrap(), Config::default())
	}

	#[test]
	fn test_bare_json_is_a_filter() {
		let params = parse_input(r#" {"limit": 1} "#);
		assert_eq!(params.get("filter"), Some(r#"{"limit": 1}"#));
	}

	#[test]
	fn test_keyed_input() {
		let params = parse_input(r#"where={"name": "A&B"}&filter={"limit": 2}"#);
		assert_eq!(params.get("where"), Some(r#"{"name": "A&B"}"#));
		assert_eq!(params.get("filter"), Some(r#"{"limit": 2}"#));
	}

	#[test]
	fn test_single_collection_is_selected() {
		let session = session();
		assert_eq!(session.collection(), Some("person"));
		assert_eq!(session.field_names(), vec!["id", "name", "age"]);
	}

	#[test]
	fn test_evaluate() {
		let session = session();
		let rows = session
			.evaluate(r#"where={"age": {"gte": 18}}"#)
			.unwrap();
		assert_eq!(rows.len(), 2);

		let err = session.evaluate("filter={oops").unwrap_err();
		assert_eq!(
			err.to_string(),
			"[400] Malformed json string for query param 'filter'"
		);
	}

	#[test]
	fn test_unknown_collection() {
		let mut session = session();
		assert!(session.use_collection("invoice").is_err());
		assert_eq!(session.collection(), Some("person"));
	}
}
