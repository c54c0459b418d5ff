use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    /// A caller broke a precondition (empty pool, no forms). Not recoverable locally.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Config error in {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    #[error("Unknown language code: {0:?}")]
    UnknownLanguage(String),

    #[error("Unknown category: {0:?}")]
    UnknownCategory(String),

    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DrillError>;

impl DrillError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DrillError::Io { path: path.into(), source }
    }
}
