use quiz::{AnswerCategory, Question};
use sqlx::SqlitePool;
use tracing::info;

use super::document_store::{write_category, write_question};
use crate::persistence::PersistenceError;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ImportReport {
    pub skipped: bool,
    pub questions: u64,
    pub categories: u64,
}

impl ImportReport {
    fn has_data(&self) -> bool {
        self.questions > 0 || self.categories > 0
    }
}

/// Copy a loaded catalog into the document store in one transaction.
///
/// When the store already holds questions or categories the import is
/// skipped and the existing counts are reported, unless `force` is set, in
/// which case every record is upserted over what is there.
pub async fn import_catalog(
    pool: &SqlitePool,
    questions: &[Question],
    categories: &[AnswerCategory],
    force: bool,
) -> Result<ImportReport, PersistenceError> {
    let existing = store_counts(pool).await?;
    if existing.has_data() && !force {
        info!(
            questions = existing.questions,
            categories = existing.categories,
            "Store already contains data, skipping import"
        );
        return Ok(ImportReport {
            skipped: true,
            ..existing
        });
    }

    let mut tx = pool.begin().await?;
    for question in questions {
        write_question(&mut *tx, question).await?;
    }
    for category in categories {
        write_category(&mut *tx, category).await?;
    }
    tx.commit().await?;

    let report = ImportReport {
        skipped: false,
        questions: questions.len() as u64,
        categories: categories.len() as u64,
    };
    info!(
        questions = report.questions,
        categories = report.categories,
        forced = force,
        "Catalog import completed"
    );
    Ok(report)
}

async fn store_counts(pool: &SqlitePool) -> Result<ImportReport, PersistenceError> {
    Ok(ImportReport {
        skipped: false,
        questions: table_count(pool, "questions").await?,
        categories: table_count(pool, "categories").await?,
    })
}

async fn table_count(pool: &SqlitePool, table: &str) -> Result<u64, PersistenceError> {
    let query = format!("SELECT COUNT(*) FROM {table}");
    let row: (i64,) = sqlx::query_as(&query).fetch_one(pool).await?;
    Ok(row.0 as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;

    fn catalog() -> (Vec<Question>, Vec<AnswerCategory>) {
        (
            vec![Question::new("q1", "one"), Question::new("q2", "two")],
            vec![AnswerCategory::new("cities", vec!["Oslo".into()]).unwrap()],
        )
    }

    #[tokio::test]
    async fn imports_into_empty_store() {
        let db = Database::new_in_memory().await.unwrap();
        let (questions, categories) = catalog();

        let report = import_catalog(db.pool(), &questions, &categories, false)
            .await
            .unwrap();

        assert_eq!(
            report,
            ImportReport {
                skipped: false,
                questions: 2,
                categories: 1
            }
        );
    }

    #[tokio::test]
    async fn second_import_is_skipped() {
        let db = Database::new_in_memory().await.unwrap();
        let (questions, categories) = catalog();
        import_catalog(db.pool(), &questions, &categories, false)
            .await
            .unwrap();

        let more = vec![Question::new("q3", "three")];
        let report = import_catalog(db.pool(), &more, &[], false).await.unwrap();

        assert!(report.skipped);
        assert_eq!(report.questions, 2);
        assert_eq!(store_counts(db.pool()).await.unwrap().questions, 2);
    }

    #[tokio::test]
    async fn forced_import_upserts_over_existing() {
        let db = Database::new_in_memory().await.unwrap();
        let (questions, categories) = catalog();
        import_catalog(db.pool(), &questions, &categories, false)
            .await
            .unwrap();

        let changed = vec![Question::new("Q1", "renamed"), Question::new("q3", "three")];
        let report = import_catalog(db.pool(), &changed, &[], true).await.unwrap();

        assert!(!report.skipped);
        let counts = store_counts(db.pool()).await.unwrap();
        assert_eq!(counts.questions, 3);
        assert_eq!(counts.categories, 1);
    }
}
