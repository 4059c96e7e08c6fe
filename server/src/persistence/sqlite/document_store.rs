//! Question and category collections on SQLite.

use std::future::Future;
use std::time::Duration;

use quiz::{normalize_category, AnswerCategory, Question, QuestionKey};
use sqlx::sqlite::SqliteExecutor;
use sqlx::SqlitePool;

use crate::persistence::traits::{LoadStrategy, QuestionSource};
use crate::persistence::{now_timestamp, LoadWarning, Loaded, PersistenceError};

// A new key takes the next sequence number; a replaced key moves to the end,
// matching the delete-then-insert order of the in-memory catalog.
const UPSERT_QUESTION: &str = r#"
    INSERT INTO questions (question_key, main_category, document, inserted_seq, updated_at)
    VALUES (?, ?, ?, (SELECT COALESCE(MAX(inserted_seq), 0) + 1 FROM questions), ?)
    ON CONFLICT(question_key) DO UPDATE SET
        main_category = excluded.main_category,
        document = excluded.document,
        inserted_seq = excluded.inserted_seq,
        updated_at = excluded.updated_at
"#;

const UPSERT_CATEGORY: &str = r#"
    INSERT INTO categories (name, answers, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT(name) DO UPDATE SET
        answers = excluded.answers,
        updated_at = excluded.updated_at
"#;

pub(super) async fn write_question<'e, E>(
    executor: E,
    question: &Question,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let document =
        serde_json::to_string(question).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    sqlx::query(UPSERT_QUESTION)
        .bind(question.key().as_str())
        .bind(question.main_category_key())
        .bind(document)
        .bind(now_timestamp() as i64)
        .execute(executor)
        .await?;
    Ok(())
}

pub(super) async fn write_category<'e, E>(
    executor: E,
    category: &AnswerCategory,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let answers =
        serde_json::to_string(&category.answers).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    sqlx::query(UPSERT_CATEGORY)
        .bind(&category.name)
        .bind(answers)
        .bind(now_timestamp() as i64)
        .execute(executor)
        .await?;
    Ok(())
}

/// Live [`QuestionSource`] over the `questions` and `categories` tables.
/// Every query is bounded by `timeout`.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T>(
        &self,
        query: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, PersistenceError> {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "SQLite query timed out");
                Err(PersistenceError::Timeout(self.timeout))
            }
        }
    }
}

fn decode_document(key: &str, document: &str) -> Result<Question, LoadWarning> {
    let question: Question =
        serde_json::from_str(document).map_err(|e| LoadWarning::Malformed {
            resource: format!("questions/{key}"),
            reason: e.to_string(),
        })?;
    question.validate().map_err(|_| LoadWarning::MissingId {
        resource: format!("questions/{key}"),
    })?;
    Ok(question)
}

fn decode_documents(rows: Vec<(String, String)>) -> Loaded<Question> {
    let mut loaded = Loaded::default();
    for (key, document) in rows {
        match decode_document(&key, &document) {
            Ok(question) => loaded.items.push(question),
            Err(warning) => loaded.skip(warning),
        }
    }
    loaded
}

impl QuestionSource for SqliteDocumentStore {
    fn describe(&self) -> String {
        "SQLite document store".to_string()
    }

    fn strategy(&self) -> LoadStrategy {
        LoadStrategy::Live
    }

    fn is_writable(&self) -> bool {
        true
    }

    async fn load_questions(&self) -> Result<Loaded<Question>, PersistenceError> {
        let rows: Vec<(String, String)> = self
            .bounded(
                sqlx::query_as(
                    "SELECT question_key, document FROM questions ORDER BY inserted_seq",
                )
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(decode_documents(rows))
    }

    async fn load_categories(&self) -> Result<Loaded<AnswerCategory>, PersistenceError> {
        let rows: Vec<(String, String)> = self
            .bounded(
                sqlx::query_as("SELECT name, answers FROM categories ORDER BY name")
                    .fetch_all(&self.pool),
            )
            .await?;

        let mut loaded = Loaded::default();
        for (name, answers) in rows {
            match serde_json::from_str::<Vec<String>>(&answers) {
                Ok(answers) => loaded.items.push(AnswerCategory { name, answers }),
                Err(e) => loaded.skip(LoadWarning::Malformed {
                    resource: format!("categories/{name}"),
                    reason: e.to_string(),
                }),
            }
        }
        Ok(loaded)
    }

    async fn persist_question(&self, question: &Question) -> Result<(), PersistenceError> {
        self.bounded(write_question(&self.pool, question)).await?;
        tracing::debug!(id = %question.id, "Upserted question document");
        Ok(())
    }

    async fn persist_category(&self, category: &AnswerCategory) -> Result<(), PersistenceError> {
        self.bounded(write_category(&self.pool, category)).await?;
        tracing::debug!(name = %category.name, "Upserted category document");
        Ok(())
    }

    async fn find_question(&self, id: &str) -> Result<Option<Question>, PersistenceError> {
        let key = QuestionKey::new(id);
        let document: Option<(String,)> = self
            .bounded(
                sqlx::query_as("SELECT document FROM questions WHERE question_key = ?")
                    .bind(key.as_str())
                    .fetch_optional(&self.pool),
            )
            .await?;

        let Some((document,)) = document else {
            return Ok(None);
        };
        match decode_document(key.as_str(), &document) {
            Ok(question) => Ok(Some(question)),
            Err(warning) => {
                tracing::warn!("Skipping record: {}", warning);
                Ok(None)
            }
        }
    }

    async fn questions_in_main_category(
        &self,
        normalized: &str,
    ) -> Result<Vec<Question>, PersistenceError> {
        let rows: Vec<(String, String)> = self
            .bounded(
                sqlx::query_as(
                    "SELECT question_key, document FROM questions \
                     WHERE main_category = ? ORDER BY inserted_seq",
                )
                .bind(normalized)
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(decode_documents(rows).items)
    }

    async fn category_answers(&self, name: &str) -> Result<Vec<String>, PersistenceError> {
        let Some(name) = normalize_category(name) else {
            return Ok(Vec::new());
        };
        let answers: Option<(String,)> = self
            .bounded(
                sqlx::query_as("SELECT answers FROM categories WHERE name = ?")
                    .bind(&name)
                    .fetch_optional(&self.pool),
            )
            .await?;

        match answers {
            Some((answers,)) => Ok(serde_json::from_str(&answers)?),
            None => Ok(Vec::new()),
        }
    }
}
