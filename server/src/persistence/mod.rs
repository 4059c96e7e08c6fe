//! Source adapters for questions and answer categories.
//!
//! Every backend implements [`QuestionSource`]; the concrete adapter is picked
//! once at startup and the rest of the server only sees the trait.
//!
//! | Type | Backend | Writable | Strategy |
//! |------|---------|----------|----------|
//! | [`BundleSource`] | packaged resources (directory or zip archive) | no | snapshot |
//! | [`DirectorySource`] | data directory, one JSON file per record | yes | snapshot |
//! | [`SqliteDocumentStore`] | two-collection document store on SQLite | yes | live |

mod bundle;
mod decode;
mod directory_source;
mod json_store;
pub mod sqlite;
mod traits;

pub use bundle::BundleSource;
pub use directory_source::DirectorySource;
pub use sqlite::{Database, SqliteDocumentStore};
pub use traits::{LoadStrategy, QuestionSource};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Glob, relative to a resource root, that selects question files.
pub const QUESTIONS_PATTERN: &str = "questions/*.json";

/// Glob, relative to a resource root, that selects category files.
pub const CATEGORIES_PATTERN: &str = "categories/*.json";

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("Invalid resource pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Source is read-only")]
    ReadOnly,
    #[error("Cannot store a record named {0:?} as a file")]
    InvalidRecordName(String),
    #[error("Query did not finish within {0:?}")]
    Timeout(Duration),
}

/// A source record that was skipped while loading. Loading always continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadWarning {
    #[error("could not read {resource}: {reason}")]
    Unreadable { resource: String, reason: String },
    #[error("could not parse {resource}: {reason}")]
    Malformed { resource: String, reason: String },
    #[error("{resource} holds a question without an id")]
    MissingId { resource: String },
    #[error("question id {id:?} was already loaded, later copy ignored")]
    DuplicateId { id: String },
}

/// Records produced by one load pass together with what was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub warnings: Vec<LoadWarning>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<T> Loaded<T> {
    pub(crate) fn skip(&mut self, warning: LoadWarning) {
        tracing::warn!("Skipping record: {}", warning);
        self.warnings.push(warning);
    }
}

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
