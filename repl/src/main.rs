mod commands;
mod completer;
pub mod display;
mod history;
mod prompt;
mod session;

use clap::Parser;
use lbquery_core::Config;
use lbquery_core::render::OutputFormat;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Editor, Result};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, fmt};

pub use self::commands::{CommandHandler, CommandResult};
pub use self::display::DisplayConfig;
pub use self::history::FilterHistory;
pub use self::session::Session;

pub struct Repl {
	editor: Editor<completer::FilterCompleter, DefaultHistory>,
	command_handler: CommandHandler,
	display_config: DisplayConfig,
	session: Session,
	history: FilterHistory,
	multiline_buffer: String,
	in_multiline: bool,
	query_count: usize,
	start_time: Instant,
}

#[derive(Debug, Clone)]
pub enum InputSource {
	Interactive,
	File(String),
	Stdin,
	CommandLine(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ReplOptions {
	pub input_source: InputSource,
	pub quiet: bool,
	pub exit_on_error: bool,
	pub no_history: bool,
	pub output_format: Option<OutputFormat>,
}

impl Default for ReplOptions {
	fn default() -> Self {
		Self {
			input_source: InputSource::Interactive,
			quiet: false,
			exit_on_error: false,
			no_history: false,
			output_format: None,
		}
	}
}

impl Repl {
	pub fn with_options(
		session: Session,
		history: FilterHistory,
		options: &ReplOptions,
	) -> Result<Self> {
		let config = rustyline::Config::builder()
			.history_ignore_space(true)
			.completion_type(rustyline::CompletionType::List)
			.edit_mode(rustyline::EditMode::Emacs)
			.build();

		let mut completer = completer::FilterCompleter::new();
		completer.set_fields(session.field_names());
		let mut editor = Editor::with_config(config)?;
		editor.set_helper(Some(completer));

		if !options.no_history {
			history.load(editor.history_mut())?;
		}

		let mut display_config = DisplayConfig::default();
		if options.quiet {
			display_config.show_timing = false;
		}
		if let Some(format) = options.output_format {
			display_config.output_format = format;
		}

		Ok(Self {
			editor,
			command_handler: CommandHandler::new(),
			display_config,
			session,
			history,
			multiline_buffer: String::new(),
			in_multiline: false,
			query_count: 0,
			start_time: Instant::now(),
		})
	}

	pub fn run_with_options(&mut self, options: &ReplOptions) -> Result<()> {
		match &options.input_source {
			InputSource::Interactive => self.run_interactive(options),
			InputSource::File(path) => {
				if !options.quiet {
					display::print_info(&format!("Executing file: {}", path));
				}
				let content = fs::read_to_string(path).map_err(ReadlineError::Io)?;
				self.execute_script(&content, options)
			}
			InputSource::Stdin => {
				let mut content = String::new();
				io::stdin()
					.read_to_string(&mut content)
					.map_err(ReadlineError::Io)?;
				self.execute_script(&content, options)
			}
			InputSource::CommandLine(commands) => {
				for command in commands {
					if !self.execute_single(command, options)? {
						break;
					}
				}
				Ok(())
			}
		}
	}

	fn run_interactive(&mut self, options: &ReplOptions) -> Result<()> {
		if !options.quiet {
			display::print_welcome();
			self.show_session_status();
		}

		loop {
			let prompt_str = prompt::generate_prompt(
				self.in_multiline,
				self.session.collection(),
				self.query_count,
				&self.display_config,
			);

			match self.editor.readline(&prompt_str) {
				Ok(line) => {
					if !self.handle_line(line, options)? {
						break;
					}
				}
				Err(ReadlineError::Interrupted) => {
					self.handle_interrupt();
				}
				Err(ReadlineError::Eof) => {
					println!();
					display::print_goodbye(self.query_count, self.start_time.elapsed());
					break;
				}
				Err(err) => {
					display::print_error(&format!("Readline error: {:?}", err));
					break;
				}
			}
		}

		if !options.no_history {
			self.history.save(self.editor.history_mut())?;
		}
		Ok(())
	}

	/// Runs a script: `.` commands, `#` comments, and filters that may span
	/// lines until their braces balance.
	fn execute_script(&mut self, content: &str, options: &ReplOptions) -> Result<()> {
		let mut pending = String::new();

		for (line_num, line) in content.lines().enumerate() {
			let trimmed = line.trim();
			if pending.is_empty() {
				if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
					continue;
				}
				if trimmed.starts_with('.') {
					if !self.dispatch_command(trimmed, options)? {
						return Ok(());
					}
					continue;
				}
			}

			if !pending.is_empty() {
				pending.push('\n');
			}
			pending.push_str(line);

			if brace_depth(&pending) <= 0 {
				let input = std::mem::take(&mut pending);
				if !self.execute_filter(&input, options.quiet) && options.exit_on_error {
					display::print_error(&format!("Stopped at line {}", line_num + 1));
					std::process::exit(1);
				}
			}
		}

		if !pending.trim().is_empty() {
			self.execute_filter(&pending, options.quiet);
		}
		Ok(())
	}

	fn execute_single(&mut self, command: &str, options: &ReplOptions) -> Result<bool> {
		let trimmed = command.trim();
		if trimmed.is_empty() {
			return Ok(true);
		}
		if trimmed.starts_with('.') {
			return self.dispatch_command(trimmed, options);
		}

		if !self.execute_filter(trimmed, options.quiet) && options.exit_on_error {
			std::process::exit(1);
		}
		Ok(true)
	}

	fn dispatch_command(&mut self, line: &str, options: &ReplOptions) -> Result<bool> {
		match self
			.command_handler
			.handle(line, &mut self.display_config, &mut self.session)
		{
			CommandResult::Continue => Ok(true),
			CommandResult::CollectionChanged => {
				let fields = self.session.field_names();
				if let Some(helper) = self.editor.helper_mut() {
					helper.set_fields(fields);
				}
				Ok(true)
			}
			CommandResult::Exit => {
				if !options.quiet {
					display::print_goodbye(self.query_count, self.start_time.elapsed());
				}
				Ok(false)
			}
			CommandResult::Error(msg) => {
				display::print_error(&msg);
				if options.exit_on_error {
					std::process::exit(1);
				}
				Ok(true)
			}
			CommandResult::ClearScreen => {
				display::clear_screen();
				if !options.quiet {
					display::print_welcome();
					self.show_session_status();
				}
				Ok(true)
			}
			CommandResult::ShowHistory => {
				display::print_history(&history::recent(self.editor.history(), 20));
				Ok(true)
			}
			CommandResult::ExecuteFromHistory(n) => {
				match history::replayable(self.editor.history(), n) {
					Some(entry) => self.execute_single(&entry, options),
					None => {
						display::print_error(&format!("No replayable history entry {}", n));
						Ok(true)
					}
				}
			}
		}
	}

	fn handle_line(&mut self, line: String, options: &ReplOptions) -> Result<bool> {
		if !line.trim().is_empty() {
			self.editor.add_history_entry(&line)?;
		}

		if !self.in_multiline && line.trim().starts_with('.') {
			return self.dispatch_command(line.trim(), options);
		}

		if self.in_multiline {
			self.multiline_buffer.push('\n');
		}
		self.multiline_buffer.push_str(&line);

		// An empty line ends multiline input
		let ended = line.trim().is_empty() && self.in_multiline;
		if !ended && brace_depth(&self.multiline_buffer) > 0 {
			self.in_multiline = true;
			return Ok(true);
		}

		self.in_multiline = false;
		let input = std::mem::take(&mut self.multiline_buffer);
		if !input.trim().is_empty() {
			self.execute_filter(&input, false);
		}
		Ok(true)
	}

	/// Evaluates one filter line against the current collection. Returns
	/// whether it succeeded.
	fn execute_filter(&mut self, input: &str, quiet: bool) -> bool {
		self.query_count += 1;

		let start = Instant::now();
		let result = self.session.evaluate(input);
		let duration = start.elapsed();

		match result {
			Ok(rows) => {
				if !quiet {
					display::print_rows(&rows, duration, &self.display_config);
				}
				true
			}
			Err(e) => {
				display::print_filter_error(&e.to_string(), input);
				false
			}
		}
	}

	fn show_session_status(&self) {
		let collections = self.session.fixture().schema.model_names();
		display::print_success(&format!("Loaded {} collection(s)", collections.len()));
		match self.session.collection() {
			Some(collection) => display::print_info(&format!("Using collection: {}", collection)),
			None => display::print_hint("Use .collections to list collections and .use <name> to pick one"),
		}
	}

	fn handle_interrupt(&mut self) {
		if self.in_multiline {
			display::print_warning("Cancelled multiline input");
			self.multiline_buffer.clear();
			self.in_multiline = false;
		} else {
			display::print_hint("Use .exit or Ctrl+D to quit");
		}
	}
}

/// Net count of open `{`/`[` outside JSON string literals.
fn brace_depth(text: &str) -> i32 {
	let mut depth = 0;
	let mut in_string = false;
	let mut escaped = false;
	for c in text.chars() {
		if in_string {
			match c {
				_ if escaped => escaped = false,
				'\\' => escaped = true,
				'"' => in_string = false,
				_ => {}
			}
			continue;
		}
		match c {
			'"' => in_string = true,
			'{' | '[' => depth += 1,
			'}' | ']' => depth -= 1,
			_ => {}
		}
	}
	depth
}

#[derive(Parser, Debug)]
#[command(name = "lbquery-repl", version, about = "Interactive loopback filter console")]
struct Cli {
	/// Fixture file holding the schema and the rows
	fixture: PathBuf,

	/// Collection to select on start
	#[arg(short, long)]
	collection: Option<String>,

	/// Configuration file
	#[arg(long, default_value = "lbquery.toml")]
	config: PathBuf,

	#[arg(long, value_enum)]
	format: Option<OutputFormat>,

	/// Run a filter or command and exit (repeatable)
	#[arg(short = 'e', long = "execute")]
	execute: Vec<String>,

	/// Run a script file; "-" reads standard input
	#[arg(short, long)]
	file: Option<String>,

	#[arg(short, long)]
	quiet: bool,

	#[arg(long)]
	exit_on_error: bool,

	#[arg(long)]
	no_history: bool,
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let config = Config::load_from_path(&cli.config)?;

	let env_filter = if std::env::var_os("RUST_LOG").is_some() {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level))
	} else {
		EnvFilter::new(format!("lbquery_core={}", config.log.level))
	};
	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();

	let mut session = Session::load(&cli.fixture, config)?;
	if let Some(collection) = &cli.collection {
		session.use_collection(collection)?;
	}

	let input_source = match (cli.file, cli.execute.is_empty()) {
		(Some(path), _) if path == "-" => InputSource::Stdin,
		(Some(path), _) => InputSource::File(path),
		(None, false) => InputSource::CommandLine(cli.execute),
		(None, true) => InputSource::Interactive,
	};
	let options = ReplOptions {
		input_source,
		quiet: cli.quiet,
		exit_on_error: cli.exit_on_error,
		no_history: cli.no_history,
		output_format: cli.format,
	};

	let history = FilterHistory::for_fixture(&cli.fixture);
	let mut repl = Repl::with_options(session, history, &options)?;
	repl.run_with_options(&options)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_brace_depth_ignores_strings() {
		assert_eq!(brace_depth(r#"{"where": {"name": "}{"#), 2);
		assert_eq!(brace_depth(r#"{"where": {"name": "a\"}"}}"#), 0);
		assert_eq!(brace_depth(r#"where={"and": [{"a": 1},"#), 2);
	}
}
