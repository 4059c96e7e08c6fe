use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::key::normalize_category;

/// A named list of candidate distractor strings.
///
/// The name is always stored normalized (trimmed, lower-cased). Answers keep
/// their order and duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCategory {
    pub name: String,
    pub answers: Vec<String>,
}

impl AnswerCategory {
    pub fn new(name: &str, answers: Vec<String>) -> Result<Self, ValidationError> {
        let name = normalize_category(name).ok_or(ValidationError::MissingCategoryName)?;
        Ok(Self { name, answers })
    }
}
