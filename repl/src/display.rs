use colored::Colorize;
use lbquery_core::render::{self, OutputFormat};
use lbquery_core::{ModelSchema, Row};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DisplayConfig {
	pub show_timing: bool,
	pub use_colors: bool,
	pub output_format: OutputFormat,
}

impl Default for DisplayConfig {
	fn default() -> Self {
		Self {
			show_timing: true,
			use_colors: true,
			output_format: OutputFormat::Table,
		}
	}
}

pub fn print_welcome() {
	println!(
		"\n{}",
		"╔═══════════════════════════════════════╗".bright_cyan()
	);
	println!(
		"{}",
		"║        lbquery filter console         ║"
			.bright_cyan()
			.bold()
	);
	println!(
		"{}",
		"╚═══════════════════════════════════════╝".bright_cyan()
	);
	println!();
	println!(
		"Type {} for help, {} to exit",
		".help".bright_green(),
		".exit".bright_green()
	);
	println!(
		"Try {}",
		r#"filter={"where": {"id": {"gt": 1}}, "order": "id DESC"}"#.bright_green()
	);
	println!();
}

pub fn print_goodbye(query_count: usize, duration: Duration) {
	println!();
	println!("{}", "─".repeat(40).bright_black());
	println!("   Ran {} filters in {:.1?}", query_count, duration);
	println!();
}

pub fn clear_screen() {
	print!("\x1B[2J\x1B[1;1H");
}

pub fn print_error(msg: &str) {
	println!("{} {}", "✗".bright_red().bold(), msg.bright_red());
}

pub fn print_warning(msg: &str) {
	println!("{} {}", "⚠".bright_yellow(), msg.bright_yellow());
}

pub fn print_info(msg: &str) {
	println!("{} {}", "ℹ".bright_blue(), msg.bright_white());
}

pub fn print_success(msg: &str) {
	println!("{} {}", "✓".bright_green().bold(), msg.bright_green());
}

pub fn print_hint(msg: &str) {
	println!("{} {}", "→".bright_white(), msg.bright_white().dimmed());
}

pub fn print_toggle(feature: &str, enabled: bool) {
	let status = if enabled {
		"ON".bright_green().bold()
	} else {
		"OFF".bright_red()
	};
	println!("{}: {}", feature, status);
}

pub fn print_rows(rows: &[Row], duration: Duration, config: &DisplayConfig) {
	println!("{}", render::render(rows, config.output_format));

	if config.show_timing {
		println!(
			"  {} {:.3}ms",
			"Time:".bright_black(),
			duration.as_secs_f64() * 1000.0
		);
	}
}

pub fn print_history(entries: &[(usize, String)]) {
	if entries.is_empty() {
		println!("No history available");
		return;
	}

	println!("\n{}", "Filter History:".bright_cyan().bold());
	println!("{}", "─".repeat(60).bright_black());
	for (n, entry) in entries {
		println!("{:4} │ {}", n, clip(entry, 60));
	}
	println!("{}", "─".repeat(60).bright_black());
	print_hint("Use .history <n> to run entry n");
}

fn clip(text: &str, width: usize) -> String {
	if text.chars().count() > width {
		format!("{}...", text.chars().take(width - 3).collect::<String>())
	} else {
		text.to_string()
	}
}

pub fn print_filter_error(error_msg: &str, input: &str) {
	print_error(error_msg);

	let lines: Vec<&str> = input.lines().collect();
	if !input.trim().is_empty() && lines.len() <= 5 {
		println!();
		println!("{}", "Input:".bright_yellow());
		for (i, line) in lines.iter().enumerate() {
			println!("{:3} │ {}", i + 1, line.dimmed());
		}
	}
}

pub fn print_schema(model: &ModelSchema) {
	println!(
		"\n{} {}",
		model.name.bright_cyan().bold(),
		format!("(primary key: {})", model.primary_key).bright_black()
	);
	for field in &model.fields {
		let kind = match &field.relation {
			Some(relation) => format!("{:?} -> {}", relation.kind, relation.target),
			None => field.field_type.name().to_string(),
		};
		println!("  {:20} {}", field.name.bright_green(), kind.bright_white());
	}
	println!();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_clip_counts_chars() {
		assert_eq!(clip("short", 10), "short");
		assert_eq!(clip("ääääääää", 6), "äää...");
	}
}
