use super::display::{self, DisplayConfig};
use super::session::Session;
use colored::Colorize;
use lbquery_core::render::OutputFormat;

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    Continue,
    /// The selected collection changed
    CollectionChanged,
    Exit,
    Error(String),
    ClearScreen,
    ShowHistory,
    ExecuteFromHistory(usize),
}

pub struct CommandHandler {}

impl CommandHandler {
    pub fn new() -> Self {
        CommandHandler {}
    }

    pub fn handle(
        &self,
        line: &str,
        display_config: &mut DisplayConfig,
        session: &mut Session,
    ) -> CommandResult {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            return CommandResult::Continue;
        }

        match parts[0] {
            ".help" | ".h" | ".?" => {
                self.show_help();
                CommandResult::Continue
            }
            ".exit" | ".quit" | ".q" => CommandResult::Exit,
            ".clear" | ".cls" => CommandResult::ClearScreen,
            ".collections" | ".tables" => {
                self.show_collections(session);
                CommandResult::Continue
            }
            ".schema" => {
                let Some(name) = parts.get(1).copied().or(session.collection()) else {
                    return CommandResult::Error("Usage: .schema <collection>".to_string());
                };
                match session.fixture().schema.get_model(name) {
                    Ok(model) => {
                        display::print_schema(model);
                        CommandResult::Continue
                    }
                    Err(e) => CommandResult::Error(e.to_string()),
                }
            }
            ".use" => match parts.get(1) {
                Some(name) => match session.use_collection(name) {
                    Ok(()) => {
                        display::print_info(&format!("Using collection: {}", name));
                        CommandResult::CollectionChanged
                    }
                    Err(e) => CommandResult::Error(e.to_string()),
                },
                None => match session.collection() {
                    Some(current) => {
                        display::print_info(&format!("Current collection: {}", current));
                        CommandResult::Continue
                    }
                    None => CommandResult::Error("Usage: .use <collection>".to_string()),
                },
            },
            ".format" | ".mode" => {
                if let Some(format) = parts.get(1) {
                    match format.parse::<OutputFormat>() {
                        Ok(format) => display_config.output_format = format,
                        Err(e) => return CommandResult::Error(e),
                    }
                    display::print_info(&format!("Output format set to: {}", parts[1]));
                } else {
                    display::print_info(&format!(
                        "Current output format: {:?}",
                        display_config.output_format
                    ));
                }
                CommandResult::Continue
            }
            ".timing" | ".time" => {
                display_config.show_timing = !display_config.show_timing;
                display::print_toggle("Timing", display_config.show_timing);
                CommandResult::Continue
            }
            ".color" | ".colors" => {
                display_config.use_colors = !display_config.use_colors;
                colored::control::set_override(display_config.use_colors);
                display::print_toggle("Colors", display_config.use_colors);
                CommandResult::Continue
            }
            ".history" | ".hist" => {
                if parts.len() > 1 {
                    if let Ok(n) = parts[1].parse::<usize>() {
                        CommandResult::ExecuteFromHistory(n)
                    } else {
                        CommandResult::Error(format!("Invalid history number: {}", parts[1]))
                    }
                } else {
                    CommandResult::ShowHistory
                }
            }
            _ => CommandResult::Error(format!(
                "Unknown command: {}. Type .help for help.",
                parts[0]
            )),
        }
    }

    fn show_help(&self) {
        println!("\n{}", "lbquery Commands".bright_cyan().bold());
        println!("{}", "─".repeat(50).bright_black());

        let commands = vec![
            (".help, .h, .?", "Show this help message"),
            (".exit, .quit, .q", "Exit the REPL"),
            (".clear, .cls", "Clear the screen"),
            ("", ""),
            ("Fixture:", ""),
            (".collections", "List all collections"),
            (".schema [name]", "Show a collection's fields"),
            (".use <name>", "Select the collection to filter"),
            ("", ""),
            ("Display Options:", ""),
            (".format <format>", "Set output format (table/json)"),
            (".timing, .time", "Toggle timing"),
            (".color, .colors", "Toggle colors"),
            ("", ""),
            ("History:", ""),
            (".history, .hist", "Show history"),
            (".history <n>", "Run history entry n"),
        ];

        for (cmd, desc) in commands {
            if cmd.is_empty() {
                println!();
            } else if desc.is_empty() {
                println!("\n{}", cmd.bright_yellow());
            } else {
                println!("  {:20} {}", cmd.bright_green(), desc.bright_white());
            }
        }

        println!("\n{}", "Filter Input:".bright_yellow());
        println!("  • filter={{...}}  full filter: where, order, fields, include, limit, skip");
        println!("  • where={{...}}   bare where clause");
        println!("  • {{...}}         same as filter={{...}}");
        println!("  • Unbalanced braces continue on the next line");
        println!("  • Ctrl+C cancels current input, Ctrl+D exits");
        println!();
    }

    fn show_collections(&self, session: &Session) {
        let names = session.fixture().schema.model_names();
        if names.is_empty() {
            display::print_info("No collections found");
            return;
        }
        display::print_info(&format!("Found {} collection(s):", names.len()));
        for name in &names {
            let rows = session.fixture().store.len(name);
            let marker = if session.collection() == Some(name.as_str()) { "*" } else { " " };
            println!("{} {} ({} rows)", marker, name.bright_green(), rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lbquery_core::{Config, Fixture};

    fn session() -> Session {
        let fixture = Fixture::from_json_str(
            r#"{"models": [
                {"name": "team", "fields": [{"name": "id"}]},
                {"name": "player", "fields": [{"name": "id"}]}
            ]}"#,
        )
        .unwrap();
        Session::new(fixture, Config::default())
    }

    #[test]
    fn test_use_switches_collection() {
        let handler = CommandHandler::new();
        let mut config = DisplayConfig::default();
        let mut session = session();
        assert_eq!(session.collection(), None);

        assert_eq!(
            handler.handle(".use team", &mut config, &mut session),
            CommandResult::CollectionChanged
        );
        assert_eq!(session.collection(), Some("team"));
        assert!(matches!(
            handler.handle(".use coach", &mut config, &mut session),
            CommandResult::Error(_)
        ));
    }

    #[test]
    fn test_format_command() {
        let handler = CommandHandler::new();
        let mut config = DisplayConfig::default();
        let mut session = session();

        handler.handle(".format json", &mut config, &mut session);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(matches!(
            handler.handle(".format xml", &mut config, &mut session),
            CommandResult::Error(_)
        ));
    }

    #[test]
    fn test_history_and_unknown() {
        let handler = CommandHandler::new();
        let mut config = DisplayConfig::default();
        let mut session = session();

        assert_eq!(
            handler.handle(".history 3", &mut config, &mut session),
            CommandResult::ExecuteFromHistory(3)
        );
        assert!(matches!(
            handler.handle(".frobnicate", &mut config, &mut session),
            CommandResult::Error(_)
        ));
    }
}
