//! In-memory catalog for snapshot-loaded sources.
//!
//! A [`Catalog`] is immutable once built. [`CatalogStore`] publishes the
//! current one behind an `Arc`: readers clone the pointer and work on a
//! consistent snapshot, writers build the next catalog and swap it in.

use std::collections::HashMap;
use std::sync::Arc;

use quiz::{normalize_category, AnswerCategory, Question, QuestionKey, ValidationError};
use tokio::sync::{Mutex, RwLock};

use crate::persistence::LoadWarning;

/// Question and category counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CatalogStats {
    pub questions: usize,
    pub categories: usize,
}

/// One immutable generation of the catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    questions: Vec<Question>,
    index: HashMap<QuestionKey, usize>,
    categories: HashMap<String, Vec<String>>,
}

impl Catalog {
    /// Build from loaded records. The first question seen for a key is kept;
    /// later ones are dropped and reported.
    pub fn build(
        questions: Vec<Question>,
        categories: Vec<AnswerCategory>,
    ) -> (Self, Vec<LoadWarning>) {
        let mut catalog = Self::default();
        let mut warnings = Vec::new();

        for question in questions {
            let key = question.key();
            if catalog.index.contains_key(&key) {
                tracing::error!(id = %question.id, "Duplicate question id in source, keeping first");
                warnings.push(LoadWarning::DuplicateId { id: question.id });
                continue;
            }
            catalog.index.insert(key, catalog.questions.len());
            catalog.questions.push(question);
        }

        for category in categories {
            catalog.categories.insert(category.name, category.answers);
        }

        (catalog, warnings)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.index
            .get(&QuestionKey::new(id))
            .map(|&i| &self.questions[i])
    }

    pub fn in_main_category(&self, normalized: &str) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| q.in_main_category(normalized))
            .cloned()
            .collect()
    }

    pub fn answers(&self, name: &str) -> Vec<String> {
        normalize_category(name)
            .and_then(|name| self.categories.get(&name).cloned())
            .unwrap_or_default()
    }

    /// All answer categories, sorted by name.
    pub fn categories(&self) -> Vec<AnswerCategory> {
        let mut categories: Vec<AnswerCategory> = self
            .categories
            .iter()
            .map(|(name, answers)| AnswerCategory {
                name: name.clone(),
                answers: answers.clone(),
            })
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            questions: self.questions.len(),
            categories: self.categories.len(),
        }
    }

    /// Next generation with `question` replacing any entry for its key,
    /// appended at the end.
    fn with_question(&self, question: Question) -> Self {
        let key = question.key();
        let mut questions: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.key() != key)
            .cloned()
            .collect();
        questions.push(question);

        let index = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (q.key(), i))
            .collect();

        Self {
            questions,
            index,
            categories: self.categories.clone(),
        }
    }

    fn with_category(&self, category: AnswerCategory) -> Self {
        let mut next = self.clone();
        next.categories.insert(category.name, category.answers);
        next
    }
}

/// Shared, concurrently readable catalog with serialized writers.
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
    writer: Mutex<()>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
            writer: Mutex::new(()),
        }
    }

    /// The current generation. It never changes under the caller.
    pub async fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().await.clone()
    }

    pub async fn all(&self) -> Vec<Question> {
        self.snapshot().await.questions().to_vec()
    }

    pub async fn by_id(&self, id: &str) -> Option<Question> {
        self.snapshot().await.get(id).cloned()
    }

    /// Questions whose main category matches `name` case-insensitively.
    /// A blank name matches nothing.
    pub async fn by_main_category(&self, name: &str) -> Vec<Question> {
        match normalize_category(name) {
            Some(normalized) => self.snapshot().await.in_main_category(&normalized),
            None => Vec::new(),
        }
    }

    pub async fn answers_for(&self, name: &str) -> Vec<String> {
        self.snapshot().await.answers(name)
    }

    pub async fn stats(&self) -> CatalogStats {
        self.snapshot().await.stats()
    }

    /// Replace the question with the same normalized id, or append it.
    /// Invalid questions leave the catalog untouched.
    pub async fn upsert(&self, question: Question) -> Result<Question, ValidationError> {
        question.validate()?;
        let _writer = self.writer.lock().await;
        let next = self.snapshot().await.with_question(question.clone());
        *self.current.write().await = Arc::new(next);
        Ok(question)
    }

    pub async fn upsert_category(&self, category: AnswerCategory) -> AnswerCategory {
        let _writer = self.writer.lock().await;
        let next = self.snapshot().await.with_category(category.clone());
        *self.current.write().await = Arc::new(next);
        category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str, title: &str) -> Question {
        Question::new(id, title)
    }

    fn store(questions: Vec<Question>) -> CatalogStore {
        let (catalog, warnings) = Catalog::build(questions, vec![]);
        assert!(warnings.is_empty());
        CatalogStore::new(catalog)
    }

    #[test]
    fn build_keeps_first_duplicate() {
        let (catalog, warnings) =
            Catalog::build(vec![q("Q1", "first"), q("q1", "second"), q("q2", "x")], vec![]);

        assert_eq!(catalog.questions().len(), 2);
        assert_eq!(catalog.get("q1").unwrap().title, "first");
        assert_eq!(
            warnings,
            vec![LoadWarning::DuplicateId {
                id: "q1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let store = store(vec![q("Q7", "seven")]);
        assert_eq!(store.by_id("q7").await.unwrap().title, "seven");
        assert_eq!(store.by_id("Q7").await.unwrap().title, "seven");
        assert!(store.by_id("q8").await.is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_whole_record_and_moves_it_last() {
        let store = store(vec![
            q("a", "old").with_main_category("Geo").with_answer("1", "x"),
            q("b", "other"),
        ]);

        store.upsert(q("A", "new")).await.unwrap();

        let all = store.all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "b");
        assert_eq!(all[1].title, "new");
        assert!(all[1].main_category.is_none());
        assert!(all[1].answers.is_empty());
        assert_eq!(store.by_id("a").await.unwrap().id, "A");
    }

    #[tokio::test]
    async fn upsert_appends_new_id() {
        let store = store(vec![q("a", "t")]);
        store.upsert(q("b", "t")).await.unwrap();
        assert_eq!(store.stats().await.questions, 2);
    }

    #[tokio::test]
    async fn invalid_upsert_leaves_catalog_unchanged() {
        let store = store(vec![q("a", "t")]);
        let before = store.all().await;

        let result = store.upsert(q("  ", "blank")).await;

        assert_eq!(result, Err(ValidationError::MissingId));
        assert_eq!(store.all().await, before);
    }

    #[tokio::test]
    async fn snapshot_is_stable_across_writes() {
        let store = store(vec![q("a", "t")]);
        let before = store.snapshot().await;
        store.upsert(q("b", "t")).await.unwrap();
        assert_eq!(before.questions().len(), 1);
        assert_eq!(store.snapshot().await.questions().len(), 2);
    }

    #[tokio::test]
    async fn main_category_filter() {
        let store = store(vec![
            q("a", "t").with_main_category("Geo"),
            q("b", "t").with_main_category(" GEO "),
            q("c", "t").with_main_category("History"),
            q("d", "t"),
        ]);
        assert_eq!(store.by_main_category("geo").await.len(), 2);
        assert!(store.by_main_category("   ").await.is_empty());
    }

    #[tokio::test]
    async fn categories_by_normalized_name() {
        let (catalog, _) = Catalog::build(
            vec![],
            vec![AnswerCategory::new("Cities", vec!["Oslo".into()]).unwrap()],
        );
        let store = CatalogStore::new(catalog);

        assert_eq!(store.answers_for("CITIES ").await, vec!["Oslo"]);
        assert!(store.answers_for("").await.is_empty());

        store
            .upsert_category(AnswerCategory::new("cities", vec!["Rome".into()]).unwrap())
            .await;
        assert_eq!(store.answers_for("Cities").await, vec!["Rome"]);
        assert_eq!(store.stats().await.categories, 1);
    }

    #[tokio::test]
    async fn concurrent_upserts_keep_one_record_per_id() {
        let store = Arc::new(store(vec![]));
        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store.upsert(q(&format!("q{}", i % 5), &i.to_string())).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(store.stats().await.questions, 5);
    }
}
