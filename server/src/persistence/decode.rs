//! Turning raw resource bytes into questions and categories.
//!
//! Shared by every file-shaped backend so a bundled archive, an unpacked
//! bundle and a data directory all accept exactly the same files.

use std::collections::HashSet;
use std::path::Path;

use quiz::{AnswerCategory, Question, QuestionList};
use serde_json::Value;

use super::{LoadWarning, Loaded};

/// One file enumerated from a resource root. Read failures are kept per
/// entry so a single unreadable file only costs that file.
#[derive(Debug)]
pub struct ResourceEntry {
    pub name: String,
    pub contents: std::io::Result<Vec<u8>>,
}

impl ResourceEntry {
    pub fn new(name: impl Into<String>, contents: std::io::Result<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }
}

/// Decode question files. Each file is a single question object or a
/// question list document (`{"questions": [...]}`).
pub fn decode_questions(entries: &[ResourceEntry]) -> Loaded<Question> {
    let mut loaded = Loaded::default();

    for entry in entries {
        let bytes = match &entry.contents {
            Ok(bytes) => bytes,
            Err(e) => {
                loaded.skip(LoadWarning::Unreadable {
                    resource: entry.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let questions = match QuestionDocument::parse(bytes) {
            Ok(document) => document.into_questions(),
            Err(e) => {
                loaded.skip(LoadWarning::Malformed {
                    resource: entry.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        for question in questions {
            if question.validate().is_err() {
                loaded.skip(LoadWarning::MissingId {
                    resource: entry.name.clone(),
                });
                continue;
            }
            if !question.tension_count_matches() {
                tracing::warn!(
                    id = %question.id,
                    declared = question.num_tension_answers,
                    actual = question.tension_answers.len(),
                    "numTensionAnswers disagrees with tensionAnswers"
                );
            }
            loaded.items.push(question);
        }
    }

    loaded
}

/// Decode category files (a JSON array of strings named after the file
/// stem), then add categories embedded in question list documents whose
/// names no standalone file claimed.
pub fn decode_categories(
    category_entries: &[ResourceEntry],
    question_entries: &[ResourceEntry],
) -> Loaded<AnswerCategory> {
    let mut loaded = Loaded::default();

    for entry in category_entries {
        let bytes = match &entry.contents {
            Ok(bytes) => bytes,
            Err(e) => {
                loaded.skip(LoadWarning::Unreadable {
                    resource: entry.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let answers: Vec<String> = match serde_json::from_slice(bytes) {
            Ok(answers) => answers,
            Err(e) => {
                loaded.skip(LoadWarning::Malformed {
                    resource: entry.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match AnswerCategory::new(&file_stem(&entry.name), answers) {
            Ok(category) => loaded.items.push(category),
            Err(e) => loaded.skip(LoadWarning::Malformed {
                resource: entry.name.clone(),
                reason: e.to_string(),
            }),
        }
    }

    let mut claimed: HashSet<String> = loaded.items.iter().map(|c| c.name.clone()).collect();
    for category in question_entries.iter().flat_map(inline_categories) {
        if claimed.insert(category.name.clone()) {
            loaded.items.push(category);
        }
    }

    loaded
}

/// Parsed contents of one question file.
pub(crate) enum QuestionDocument {
    Single(Question),
    List(QuestionList),
}

impl QuestionDocument {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        if value.get("questions").is_some() {
            Ok(Self::List(serde_json::from_value(value)?))
        } else {
            Ok(Self::Single(serde_json::from_value(value)?))
        }
    }

    fn into_questions(self) -> Vec<Question> {
        match self {
            Self::Single(question) => vec![question],
            Self::List(list) => list.questions,
        }
    }
}

// Problems with these files are already reported by the question pass.
fn inline_categories(entry: &ResourceEntry) -> Vec<AnswerCategory> {
    let Ok(bytes) = &entry.contents else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_slice::<Value>(bytes) else {
        return Vec::new();
    };
    if value.get("answersCategories").is_none() {
        return Vec::new();
    }
    serde_json::from_value::<QuestionList>(value)
        .map(|list| list.categories())
        .unwrap_or_default()
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
