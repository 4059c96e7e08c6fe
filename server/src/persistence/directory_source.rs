use std::path::PathBuf;

use quiz::{AnswerCategory, Question};

use super::decode::{decode_categories, decode_questions, QuestionDocument};
use super::json_store::JsonStore;
use super::traits::QuestionSource;
use super::{Loaded, PersistenceError};

/// Writable data directory laid out like a bundle: `questions/<id>.json`
/// and `categories/<name>.json`.
///
/// Question files may be named freely and may hold question lists, so a
/// persisted question first replaces every other copy of its id on disk.
pub struct DirectorySource {
    root: PathBuf,
    questions: JsonStore,
    categories: JsonStore,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            questions: JsonStore::new(root.join("questions")),
            categories: JsonStore::new(root.join("categories")),
            root,
        }
    }
}

impl QuestionSource for DirectorySource {
    fn describe(&self) -> String {
        format!("data directory {}", self.root.display())
    }

    fn is_writable(&self) -> bool {
        true
    }

    async fn load_questions(&self) -> Result<Loaded<Question>, PersistenceError> {
        Ok(decode_questions(&self.questions.read_all()?))
    }

    async fn load_categories(&self) -> Result<Loaded<AnswerCategory>, PersistenceError> {
        let categories = self.categories.read_all()?;
        let questions = self.questions.read_all()?;
        Ok(decode_categories(&categories, &questions))
    }

    async fn persist_question(&self, question: &Question) -> Result<(), PersistenceError> {
        let target = self.questions.file_path(&question.id)?;
        let key = question.key();
        let mut stored_in_list = false;

        for path in self.questions.files()? {
            let is_target = path == target;
            // Unreadable or malformed files cannot shadow the question on reload.
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            let Ok(document) = QuestionDocument::parse(&bytes) else {
                continue;
            };

            match document {
                QuestionDocument::Single(existing) => {
                    if !is_target && existing.key() == key {
                        tracing::debug!("Removing previous copy of {} at {:?}", question.id, path);
                        std::fs::remove_file(&path)?;
                    }
                }
                QuestionDocument::List(mut list) => {
                    let before = list.questions.len();
                    list.questions.retain(|q| q.key() != key);
                    if is_target {
                        list.questions.push(question.clone());
                        self.questions.write_file(&path, &list)?;
                        stored_in_list = true;
                    } else if list.questions.len() != before {
                        tracing::debug!("Removing {} from list {:?}", question.id, path);
                        self.questions.write_file(&path, &list)?;
                    }
                }
            }
        }

        if !stored_in_list {
            self.questions.write_file(&target, question)?;
        }
        tracing::debug!("Saved question {} to {:?}", question.id, target);
        Ok(())
    }

    async fn persist_category(&self, category: &AnswerCategory) -> Result<(), PersistenceError> {
        let path = self.categories.save_replacing_variants(&category.name, &category.answers)?;
        tracing::debug!("Saved category {} to {:?}", category.name, path);
        Ok(())
    }
}
