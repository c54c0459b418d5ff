use log::info;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{DrillError, Result};
use crate::progression::rules::ProgressionRules;
use crate::progression::timing::TimingPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory for progress.json and stats.json.
    pub data_dir: PathBuf,
    /// Extra language packs, loaded on top of the built-in ones.
    pub vocabulary_dir: Option<PathBuf>,
    pub default_language: String,
    pub audio_enabled: bool,
    pub rules: ProgressionRules,
    pub timing: TimingPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".waffley"),
            vocabulary_dir: None,
            default_language: "es".to_string(),
            audio_enabled: true,
            rules: ProgressionRules::default(),
            timing: TimingPolicy::default(),
        }
    }
}

impl Config {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(dir) = &self.vocabulary_dir {
            if !dir.is_dir() {
                return Err(format!("vocabulary_dir ('{}') is not a valid directory", dir.display()));
            }
        }
        if self.default_language.trim().is_empty() {
            return Err("default_language must not be empty".to_string());
        }
        self.rules.validate()?;
        self.timing.validate()
    }
}

pub fn load_config_from_file(file_path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(file_path).map_err(|e| DrillError::io(file_path, e))?;
    parse_config(file_path, &contents)
}

/// Like [`load_config_from_file`], but a missing file means "use defaults".
pub fn load_config_or_default(file_path: &Path) -> Result<Config> {
    match fs::read_to_string(file_path) {
        Ok(contents) => parse_config(file_path, &contents),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No config at {}, using defaults", file_path.display());
            Ok(Config::default())
        }
        Err(e) => Err(DrillError::io(file_path, e)),
    }
}

fn parse_config(file_path: &Path, contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| DrillError::Config {
        path: file_path.to_path_buf(),
        message: format!("failed to parse: {}", e),
    })?;
    config.validate().map_err(|message| DrillError::Config {
        path: file_path.to_path_buf(),
        message,
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            "default_language = \"fr\"\n\n[timing]\ntyping_min_seconds = 3\n\n[rules]\nmastery_threshold = 3\n",
        )
        .unwrap();
        let config = load_config_from_file(&path).unwrap();
        assert_eq!(config.default_language, "fr");
        assert_eq!(config.timing.typing_min_seconds, Some(3));
        assert_eq!(config.timing.max_seconds, 10);
        assert_eq!(config.rules.mastery_threshold, 3);
        assert_eq!(config.rules.levels_per_phase, 10);
        assert!(config.audio_enabled);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(load_config_from_file(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[timing]\nmin_seconds = 12\n").unwrap();
        assert!(matches!(load_config_from_file(&path), Err(DrillError::Config { .. })));

        fs::write(&path, "vocabulary_dir = \"/definitely/not/here\"\n").unwrap();
        assert!(matches!(load_config_from_file(&path), Err(DrillError::Config { .. })));

        fs::write(&path, "data_dir = [1, 2]\n").unwrap();
        assert!(matches!(load_config_from_file(&path), Err(DrillError::Config { .. })));
    }
}
