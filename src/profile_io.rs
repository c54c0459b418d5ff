use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::{DrillError, Result};
use crate::profile::{Progress, ProgressDocument};
use crate::stats::{Statistics, StatsSink};
use crate::types::category::Category;

pub const PROGRESS_FILE: &str = "progress.json";
pub const STATS_FILE: &str = "stats.json";

/// Persistence for per-language, per-category progress.
///
/// Loading never fails: missing or unreadable records come back as fresh
/// progress, with a warning in the log.
pub trait ProgressStore {
    fn load(&self, language: &str, category: Category) -> Progress;
    fn save(&mut self, language: &str, category: Category, progress: &Progress) -> Result<()>;
    /// Clears every category of `language`.
    fn reset_language(&mut self, language: &str) -> Result<()>;
    fn reset_all(&mut self) -> Result<()>;
    fn total_correct_all(&self) -> u64;
}

/// Reads a JSON file, treating a missing or unparsable file as absent.
fn read_json_value(file_path: &Path) -> Option<Value> {
    let file = match File::open(file_path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No file at {:?} yet", file_path);
            return None;
        }
        Err(e) => {
            warn!("Failed to open {:?}: {}", file_path, e);
            return None;
        }
    };
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable JSON in {:?}: {}", file_path, e);
            None
        }
    }
}

fn write_json_pretty<T: Serialize>(file_path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DrillError::io(parent, e))?;
    }
    let file = File::create(file_path).map_err(|e| DrillError::io(file_path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

/// Progress kept in one JSON document on disk, rewritten on every save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: ProgressDocument,
}

impl JsonFileStore {
    pub fn open(file_path: impl Into<PathBuf>) -> Self {
        let path = file_path.into();
        let document = read_json_value(&path)
            .map(ProgressDocument::from_value)
            .unwrap_or_default();
        debug!("Opened progress store {:?} with {} record(s)", path, document.languages.len());
        Self { path, document }
    }

    /// The store at `<data_dir>/progress.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::open(data_dir.join(PROGRESS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &ProgressDocument {
        &self.document
    }

    fn flush(&self) -> Result<()> {
        write_json_pretty(&self.path, &self.document)
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self, language: &str, category: Category) -> Progress {
        self.document.get(language, category)
    }

    fn save(&mut self, language: &str, category: Category, progress: &Progress) -> Result<()> {
        self.document.set(language, category, *progress);
        self.flush()
    }

    fn reset_language(&mut self, language: &str) -> Result<()> {
        self.document.remove_language(language);
        self.flush()
    }

    fn reset_all(&mut self) -> Result<()> {
        self.document = ProgressDocument::default();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DrillError::io(&self.path, e)),
        }
    }

    fn total_correct_all(&self) -> u64 {
        self.document.total_correct_all()
    }
}

/// Progress that is gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: ProgressDocument,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self, language: &str, category: Category) -> Progress {
        self.document.get(language, category)
    }

    fn save(&mut self, language: &str, category: Category, progress: &Progress) -> Result<()> {
        self.document.set(language, category, *progress);
        Ok(())
    }

    fn reset_language(&mut self, language: &str) -> Result<()> {
        self.document.remove_language(language);
        Ok(())
    }

    fn reset_all(&mut self) -> Result<()> {
        self.document = ProgressDocument::default();
        Ok(())
    }

    fn total_correct_all(&self) -> u64 {
        self.document.total_correct_all()
    }
}

/// Lifetime statistics in `<data_dir>/stats.json`.
#[derive(Debug)]
pub struct JsonStatsStore {
    path: PathBuf,
    stats: Statistics,
}

impl JsonStatsStore {
    pub fn open(file_path: impl Into<PathBuf>) -> Self {
        let path = file_path.into();
        let stats = read_json_value(&path)
            .and_then(|value| match serde_json::from_value(value) {
                Ok(stats) => Some(stats),
                Err(e) => {
                    warn!("Statistics in {:?} are unreadable, starting over: {}", path, e);
                    None
                }
            })
            .unwrap_or_default();
        Self { path, stats }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::open(data_dir.join(STATS_FILE))
    }
}

impl StatsSink for JsonStatsStore {
    fn statistics(&self) -> &Statistics {
        &self.stats
    }

    fn record_game(&mut self, session_score: u64, language: &str, current_cycle: u32) -> Result<()> {
        self.stats.record_game(session_score, language, current_cycle);
        write_json_pretty(&self.path, &self.stats)
    }

    fn reset(&mut self) -> Result<()> {
        self.stats = Statistics::default();
        write_json_pretty(&self.path, &self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn saved_progress_survives_reopen() {
        let dir = tempdir().unwrap();
        let progress = Progress { total_correct_answers: 33, current_cycle: 2, levels_completed: 44 };
        {
            let mut store = JsonFileStore::in_dir(dir.path());
            store.save("fr", Category::Animals, &progress).unwrap();
        }
        let store = JsonFileStore::in_dir(dir.path());
        assert_eq!(store.load("fr", Category::Animals), progress);
        assert_eq!(store.load("fr", Category::Food), Progress::default());

        let raw = fs::read_to_string(dir.path().join(PROGRESS_FILE)).unwrap();
        assert!(raw.contains("\"fr_animals\""));
        assert!(raw.contains("\"levelsCompleted\": 44"));
    }

    #[test]
    fn corrupt_file_loads_as_fresh_progress() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PROGRESS_FILE), "{ not json").unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        assert_eq!(store.load("es", Category::Colours), Progress::default());
        assert_eq!(store.total_correct_all(), 0);
    }

    #[test]
    fn legacy_file_is_migrated_on_open() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PROGRESS_FILE), r#"{"totalAnswers": 123, "currentCycle": 1}"#).unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        assert_eq!(store.load("es", Category::Colours).levels_completed, 12);
    }

    #[test]
    fn resets_clear_one_language_or_everything() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::in_dir(dir.path());
        let progress = Progress { total_correct_answers: 10, ..Progress::default() };
        store.save("es", Category::Colours, &progress).unwrap();
        store.save("es", Category::Weather, &progress).unwrap();
        store.save("de", Category::Colours, &progress).unwrap();

        store.reset_language("es").unwrap();
        assert_eq!(store.load("es", Category::Weather), Progress::default());
        assert_eq!(store.total_correct_all(), 10);

        store.reset_all().unwrap();
        assert_eq!(store.total_correct_all(), 0);
        assert!(!dir.path().join(PROGRESS_FILE).exists());
        // Resetting twice is fine.
        store.reset_all().unwrap();
    }

    #[test]
    fn stats_store_persists_games() {
        let dir = tempdir().unwrap();
        {
            let mut stats = JsonStatsStore::in_dir(dir.path());
            stats.record_game(12, "cy", 3).unwrap();
        }
        let stats = JsonStatsStore::in_dir(dir.path());
        assert_eq!(stats.statistics().best_streak, 12);
        assert_eq!(stats.statistics().highest_cycle, 3);
        assert_eq!(stats.statistics().average_for("cy"), 12.0);
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        let progress = Progress { levels_completed: 3, ..Progress::default() };
        store.save("it", Category::Food, &progress).unwrap();
        assert_eq!(store.load("it", Category::Food), progress);
        store.reset_all().unwrap();
        assert_eq!(store.load("it", Category::Food), Progress::default());
    }
}
