use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::AnswerCategory;
use crate::error::ValidationError;
use crate::key::{normalize_category, QuestionKey};

/// Label → answer text. Labels are usually small integers ("1", "2", ...)
/// but any string is accepted.
pub type AnswerMap = BTreeMap<String, String>;

/// A quiz prompt with its correct answers and its decoy ("tension") answers.
///
/// Field names follow the JSON files and documents the catalog is loaded
/// from. Missing fields deserialize to their empty value so a partially
/// filled record still loads; only the id is checked, by [`Question::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "questionId", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_category: Option<String>,
    /// Declared decoy count. Advisory only: it is never enforced against
    /// `tension_answers`, see [`Question::tension_count_matches`].
    #[serde(default)]
    pub num_tension_answers: u32,
    #[serde(default)]
    pub answers: AnswerMap,
    #[serde(default)]
    pub tension_answers: AnswerMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers_category: Option<String>,
}

impl Question {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_main_category(mut self, category: impl Into<String>) -> Self {
        self.main_category = Some(category.into());
        self
    }

    pub fn with_answer(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.answers.insert(label.into(), text.into());
        self
    }

    pub fn with_tension_answer(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.tension_answers.insert(label.into(), text.into());
        self.num_tension_answers = self.tension_answers.len() as u32;
        self
    }

    pub fn with_answers_category(mut self, category: impl Into<String>) -> Self {
        self.answers_category = Some(category.into());
        self
    }

    /// Normalized lookup key for this question's id.
    pub fn key(&self) -> QuestionKey {
        QuestionKey::new(&self.id)
    }

    /// Reject ids that are empty or whitespace-only.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingId);
        }
        Ok(())
    }

    /// The main category trimmed and lower-cased, if set and non-blank.
    pub fn main_category_key(&self) -> Option<String> {
        self.main_category.as_deref().and_then(normalize_category)
    }

    /// Case-insensitive match against an already normalized category name.
    pub fn in_main_category(&self, normalized: &str) -> bool {
        self.main_category_key().as_deref() == Some(normalized)
    }

    /// Whether `num_tension_answers` agrees with the decoy map size.
    pub fn tension_count_matches(&self) -> bool {
        self.num_tension_answers as usize == self.tension_answers.len()
    }
}

/// A file that bundles several questions, optionally with inline answer
/// categories: `{"questions": [...], "answersCategories": [{"cities": [...]}]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionList {
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers_categories: Vec<BTreeMap<String, Vec<String>>>,
}

impl QuestionList {
    /// Flatten the inline category maps. Entries with blank names are dropped.
    pub fn categories(&self) -> Vec<AnswerCategory> {
        self.answers_categories
            .iter()
            .flat_map(|map| map.iter())
            .filter_map(|(name, answers)| AnswerCategory::new(name, answers.clone()).ok())
            .collect()
    }
}
