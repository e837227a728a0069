use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History, SearchDirection};
use rustyline::Result;
use std::io;
use std::path::{Path, PathBuf};

/// Filter history kept beside the fixture it was typed against, so each
/// fixture gets its own `.<stem>.lbquery_history`.
pub struct FilterHistory {
    path: PathBuf,
}

impl FilterHistory {
    pub fn for_fixture(fixture: &Path) -> Self {
        let stem = fixture
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("fixture");
        let dir = fixture.parent().unwrap_or_else(|| Path::new(""));
        Self {
            path: dir.join(format!(".{}.lbquery_history", stem)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty history.
    pub fn load(&self, history: &mut DefaultHistory) -> Result<()> {
        match history.load(&self.path) {
            Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    pub fn save(&self, history: &mut DefaultHistory) -> Result<()> {
        history.save(&self.path)
    }
}

/// The last `count` entries, numbered from 1 as `.history <n>` expects.
pub fn recent(history: &DefaultHistory, count: usize) -> Vec<(usize, String)> {
    let len = history.len();
    (len.saturating_sub(count)..len)
        .filter_map(|i| entry_at(history, i).map(|entry| (i + 1, entry)))
        .collect()
}

/// Entry `n` (1-based) if it exists and can be run again. Replaying a
/// `.history` line would recurse.
pub fn replayable(history: &DefaultHistory, n: usize) -> Option<String> {
    let entry = entry_at(history, n.checked_sub(1)?)?;
    (!entry.trim_start().starts_with(".history")).then_some(entry)
}

fn entry_at(history: &DefaultHistory, index: usize) -> Option<String> {
    history
        .get(index, SearchDirection::Forward)
        .ok()
        .flatten()
        .map(|found| found.entry.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn history_of(lines: &[&str]) -> DefaultHistory {
        let mut history = DefaultHistory::new();
        for line in lines {
            history.add(line).unwrap();
        }
        history
    }

    #[test]
    fn test_history_file_follows_fixture() {
        let history = FilterHistory::for_fixture(Path::new("demos/people.json"));
        assert_eq!(history.path(), Path::new("demos/.people.lbquery_history"));
    }

    #[test]
    fn test_recent_numbers_from_one() {
        let history = history_of(&["where={\"a\": 1}", ".use person", "{\"limit\": 2}"]);
        assert_eq!(
            recent(&history, 2),
            vec![(2, ".use person".to_string()), (3, "{\"limit\": 2}".to_string())]
        );
        assert_eq!(recent(&history, 10).len(), 3);
    }

    #[test]
    fn test_history_commands_are_not_replayed() {
        let history = history_of(&["{\"limit\": 1}", ".history 1"]);
        assert_eq!(replayable(&history, 1).as_deref(), Some("{\"limit\": 1}"));
        assert_eq!(replayable(&history, 2), None);
        assert_eq!(replayable(&history, 0), None);
        assert_eq!(replayable(&history, 3), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let file = FilterHistory::for_fixture(&dir.path().join("shop.json"));

        let mut empty = DefaultHistory::new();
        file.load(&mut empty).unwrap();
        assert_eq!(empty.len(), 0);

        let mut history = history_of(&["where={\"sku\": \"A1\"}"]);
        file.save(&mut history).unwrap();

        let mut reloaded = DefaultHistory::new();
        file.load(&mut reloaded).unwrap();
        assert_eq!(recent(&reloaded, 5), vec![(1, "where={\"sku\": \"A1\"}".to_string())]);
    }
}
