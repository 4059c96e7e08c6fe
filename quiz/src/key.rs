//! Normalized lookup keys.
//!
//! Question ids compare case-insensitively; category names (both answer
//! categories and a question's main category) are additionally trimmed.

use std::fmt;

/// Lower-cased question id used for indexing. The original casing stays on
/// the [`Question`](crate::Question) itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionKey(String);

impl QuestionKey {
    pub fn new(id: &str) -> Self {
        Self(id.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim and lower-case a category name. Blank names normalize to `None`.
pub fn normalize_category(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
