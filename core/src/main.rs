//! lbquery command line
//!
//! Applies one `filter` or `where` query to a collection of a JSON fixture
//! and prints the resulting rows.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use lbquery_core::render::{self, OutputFormat};
use lbquery_core::{Config, Fixture, LoopbackFilterBackend, QueryParams, QuerySet};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "lbquery", version, about = "Run a loopback-style filter against a JSON fixture")]
struct Cli {
	/// Fixture file holding the schema and the rows
	#[arg(long)]
	fixture: PathBuf,

	/// Collection to query
	#[arg(short, long)]
	collection: String,

	/// Full filter object, e.g. '{"where": {"age": {"gt": 18}}, "limit": 10}'
	#[arg(short, long)]
	filter: Option<String>,

	/// Bare where clause, e.g. '{"status": "active"}'
	#[arg(short, long = "where")]
	where_clause: Option<String>,

	/// Configuration file
	#[arg(long, default_value = "lbquery.toml")]
	config: PathBuf,

	#[arg(long, value_enum, default_value_t = OutputFormat::Table)]
	format: OutputFormat,
}

fn get_env_filter(level: &str) -> EnvFilter {
	if std::env::var_os("RUST_LOG").is_some() {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
	} else {
		EnvFilter::new(format!("lbquery_core={level},lbquery={level}"))
	}
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let config = Config::load_from_path(&cli.config)?;

	fmt()
		.with_env_filter(get_env_filter(&config.log.level))
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();

	let fixture = Fixture::load(&cli.fixture)
		.with_context(|| format!("failed to load fixture {}", cli.fixture.display()))?;
	tracing::debug!(
		collections = fixture.schema.models.len(),
		"loaded fixture {}",
		cli.fixture.display()
	);

	let mut params = QueryParams::new();
	if let Some(filter) = cli.filter {
		params.insert("filter", filter);
	}
	if let Some(clause) = cli.where_clause {
		params.insert("where", clause);
	}

	let backend = LoopbackFilterBackend::new(&fixture.schema, &fixture.store).with_config(config.filter);
	match backend.fetch(&params, QuerySet::new(&cli.collection)) {
		Ok(rows) => {
			println!("{}", render::render(&rows, cli.format));
			Ok(())
		}
		Err(e) => {
			eprintln!(
				"{} {}",
				format!("Error ({}):", e.kind().status_code()).bright_red(),
				e
			);
			std::process::exit(1);
		}
	}
}
