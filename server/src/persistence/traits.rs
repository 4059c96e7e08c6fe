//! The capability set every question/category backend provides.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send` and the service can be driven from any
//! tokio worker.

use std::future::Future;

use quiz::{normalize_category, AnswerCategory, Question, QuestionKey};

use super::{Loaded, PersistenceError};

/// How the retrieval service should consume a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Load everything once into the in-memory catalog.
    Snapshot,
    /// Query the source on every call; nothing is cached locally.
    Live,
}

/// A backend that supplies questions and answer categories and, when
/// writable, persists upserted records.
///
/// The lookup methods have default implementations on top of the load
/// operations; live backends override them with native queries.
pub trait QuestionSource: Send + Sync {
    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    fn strategy(&self) -> LoadStrategy {
        LoadStrategy::Snapshot
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn load_questions(
        &self,
    ) -> impl Future<Output = Result<Loaded<Question>, PersistenceError>> + Send;

    fn load_categories(
        &self,
    ) -> impl Future<Output = Result<Loaded<AnswerCategory>, PersistenceError>> + Send;

    fn persist_question(
        &self,
        _question: &Question,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send {
        async { Err::<(), _>(PersistenceError::ReadOnly) }
    }

    fn persist_category(
        &self,
        _category: &AnswerCategory,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send {
        async { Err::<(), _>(PersistenceError::ReadOnly) }
    }

    fn find_question(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Question>, PersistenceError>> + Send {
        let key = QuestionKey::new(id);
        async move {
            let loaded = self.load_questions().await?;
            Ok(loaded.items.into_iter().find(|q| q.key() == key))
        }
    }

    /// Questions whose main category equals `normalized` (already trimmed
    /// and lower-cased).
    fn questions_in_main_category(
        &self,
        normalized: &str,
    ) -> impl Future<Output = Result<Vec<Question>, PersistenceError>> + Send {
        let wanted = normalized.to_string();
        async move {
            let loaded = self.load_questions().await?;
            Ok(loaded
                .items
                .into_iter()
                .filter(|q| q.in_main_category(&wanted))
                .collect())
        }
    }

    /// Answers of the category named `name`; unknown names yield an empty list.
    fn category_answers(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<String>, PersistenceError>> + Send {
        let wanted = normalize_category(name);
        async move {
            let Some(wanted) = wanted else {
                return Ok(Vec::new());
            };
            let loaded = self.load_categories().await?;
            Ok(loaded
                .items
                .into_iter()
                .find(|c| c.name == wanted)
                .map(|c| c.answers)
                .unwrap_or_default())
        }
    }
}
