//! Output rendering shared by the command line and the REPL.

use std::str::FromStr;

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};

use crate::query::{Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
	#[default]
	Table,
	Json,
}

impl FromStr for OutputFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"table" => Ok(OutputFormat::Table),
			"json" => Ok(OutputFormat::Json),
			other => Err(format!("unknown output format '{}' (expected table or json)", other)),
		}
	}
}

pub fn render(rows: &[Row], format: OutputFormat) -> String {
	match format {
		OutputFormat::Table => render_table(rows),
		OutputFormat::Json => render_json(rows),
	}
}

/// Pretty-printed JSON array of the rows.
pub fn render_json(rows: &[Row]) -> String {
	let rows = serde_json::Value::Array(rows.iter().map(Row::to_json).collect());
	format!("{:#}", rows)
}

/// A table with one column per key seen in any row, in first-seen order.
pub fn render_table(rows: &[Row]) -> String {
	if rows.is_empty() {
		return "(0 rows)".to_string();
	}

	let mut columns: Vec<&str> = Vec::new();
	for row in rows {
		for column in row.data.keys() {
			if !columns.contains(&column.as_str()) {
				columns.push(column.as_str());
			}
		}
	}

	let mut table = Table::new();
	table
		.load_preset(UTF8_FULL)
		.set_content_arrangement(ContentArrangement::Dynamic)
		.set_header(columns.iter().copied());
	for row in rows {
		table.add_row(columns.iter().map(|c| cell_text(row.value(c))));
	}

	let plural = if rows.len() == 1 { "" } else { "s" };
	format!("{}\n({} row{})", table, rows.len(), plural)
}

fn cell_text(value: &Value) -> String {
	match value {
		Value::Null => "NULL".to_string(),
		Value::String(s) => s.clone(),
		Value::List(_) | Value::Object(_) => value.to_json().to_string(),
		other => other.as_text().unwrap_or_default(),
	}
}
