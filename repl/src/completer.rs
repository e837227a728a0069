use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper, Result};

const WORD_BREAKS: &str = "{}[](),:\" ";

pub struct FilterCompleter {
    commands: Vec<&'static str>,
    clause_keys: Vec<&'static str>,
    operators: Vec<&'static str>,
    directions: Vec<&'static str>,
    fields: Vec<String>,
}

impl FilterCompleter {
    pub fn new() -> Self {
        Self {
            commands: vec![
                ".help",
                ".exit",
                ".clear",
                ".collections",
                ".schema",
                ".use",
                ".format",
                ".timing",
                ".color",
                ".history",
            ],
            clause_keys: vec![
                "filter=", "where=", "where", "order", "fields", "include", "limit", "skip",
                "offset", "and", "or",
            ],
            operators: vec![
                "eq", "neq", "gt", "gte", "lt", "lte", "inq", "nin", "between", "like", "nlike",
                "ilike", "nilike", "regexp",
            ],
            directions: vec!["ASC", "DESC"],
            fields: Vec::new(),
        }
    }

    /// Field names of the selected collection.
    pub fn set_fields(&mut self, fields: Vec<String>) {
        self.fields = fields;
    }

    fn word_start(line: &str, pos: usize) -> usize {
        line[..pos]
            .rfind(|c: char| WORD_BREAKS.contains(c))
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn get_context(&self, line: &str, pos: usize) -> CompletionContext {
        let before = &line[..pos];
        if before.trim_start().starts_with('.') {
            return CompletionContext::Command;
        }
        if before.trim().is_empty() {
            return CompletionContext::Start;
        }

        // Directly after `"order": "field `
        if let Some(order_at) = before.rfind("\"order\"") {
            let tail = &before[order_at + 7..];
            if tail.matches('"').count() == 1 && tail.ends_with(' ') {
                return CompletionContext::Direction;
            }
        }

        // Inside the object following a field key, e.g. `{"age": {"`
        let head = line[..Self::word_start(line, pos)].trim_end_matches('"');
        let parent_key = head
            .strip_suffix(": {")
            .and_then(|rest| rest.trim_end_matches('"').rsplit('"').next());
        match parent_key {
            Some("where") | None => CompletionContext::Key,
            Some(_) => CompletionContext::Operator,
        }
    }

    fn get_completions(&self, line: &str, pos: usize) -> Vec<Pair> {
        let start = Self::word_start(line, pos);
        let partial = &line[start..pos];
        let candidates: Vec<String> = match self.get_context(line, pos) {
            CompletionContext::Command => {
                let start = line[..pos].find('.').unwrap_or(0);
                let typed = &line[start..pos];
                return self
                    .commands
                    .iter()
                    .filter(|c| c.starts_with(typed))
                    .map(|c| pair(c))
                    .collect();
            }
            CompletionContext::Start => ["filter=", "where="].iter().map(|k| k.to_string()).collect(),
            CompletionContext::Direction => self.directions.iter().map(|d| d.to_string()).collect(),
            CompletionContext::Operator => self.operators.iter().map(|o| o.to_string()).collect(),
            CompletionContext::Key => self
                .clause_keys
                .iter()
                .map(|k| k.to_string())
                .chain(self.fields.iter().cloned())
                .collect(),
        };

        let mut completions: Vec<Pair> = candidates
            .iter()
            .filter(|c| c.starts_with(partial))
            .map(|c| pair(c))
            .collect();
        completions.sort_by(|a, b| a.display.len().cmp(&b.display.len()).then(a.display.cmp(&b.display)));
        completions.dedup_by(|a, b| a.display == b.display);
        completions
    }
}

fn pair(text: &str) -> Pair {
    Pair {
        display: text.to_string(),
        replacement: text.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionContext {
    Start,
    Command,
    Key,
    Operator,
    Direction,
}

impl Completer for FilterCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        let completions = self.get_completions(line, pos);
        let start = if self.get_context(line, pos) == CompletionContext::Command {
            line[..pos].find('.').unwrap_or(0)
        } else {
            Self::word_start(line, pos)
        };
        Ok((start, completions))
    }
}

impl Hinter for FilterCompleter {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }

        match line {
            "filter=" => Some(r#"{"where": {...}, "order": "<field> ASC", "limit": 10}"#.to_string()),
            "where=" => Some(r#"{"<field>": {"<operator>": <value>}}"#.to_string()),
            ".use " | ".schema " => Some("<collection>".to_string()),
            ".format " => Some("table|json".to_string()),
            _ => None,
        }
    }
}

impl Highlighter for FilterCompleter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> std::borrow::Cow<'l, str> {
        std::borrow::Cow::Borrowed(line)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> std::borrow::Cow<'b, str> {
        std::borrow::Cow::Borrowed(prompt)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> std::borrow::Cow<'h, str> {
        std::borrow::Cow::Owned(format!("\x1b[2m{}\x1b[0m", hint))
    }
}

impl Validator for FilterCompleter {}

impl Helper for FilterCompleter {}
