//! The retrieval service: the one entry point callers use for questions and
//! answer categories, whatever backend is configured.
//!
//! Snapshot sources are loaded once into a [`CatalogStore`], which then
//! answers every read; writes go to the catalog first and are persisted to
//! the source afterwards when it is writable. Live sources are queried on
//! every call and their upsert is the persistence step itself.

use quiz::{normalize_category, AnswerCategory, Question, Sampler, ValidationError};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::catalog::{Catalog, CatalogStats, CatalogStore};
use crate::persistence::sqlite::{import_catalog, ImportReport};
use crate::persistence::{LoadStrategy, LoadWarning, PersistenceError, QuestionSource};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid record: {0}")]
    Validation(#[from] ValidationError),
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Outcome of the initial load of a snapshot source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub questions: usize,
    pub categories: usize,
    pub warnings: Vec<LoadWarning>,
}

pub struct RetrievalService<S> {
    source: S,
    sampler: Sampler,
    catalog: Option<CatalogStore>,
    report: LoadReport,
    // Held across the catalog swap and the write-through so the last
    // write to the catalog is also the last write to the source.
    writes: Mutex<()>,
}

impl<S: QuestionSource> RetrievalService<S> {
    /// Prepare the service for `source`. Snapshot sources are loaded here;
    /// skipped records end up in [`RetrievalService::load_report`].
    pub async fn open(source: S, sampler: Sampler) -> Result<Self, ServiceError> {
        let (catalog, report) = match source.strategy() {
            LoadStrategy::Live => {
                tracing::info!(source = %source.describe(), "Serving questions live");
                (None, LoadReport::default())
            }
            LoadStrategy::Snapshot => {
                let questions = source.load_questions().await?;
                let categories = source.load_categories().await?;

                let mut warnings = questions.warnings;
                warnings.extend(categories.warnings);
                let (catalog, duplicates) = Catalog::build(questions.items, categories.items);
                warnings.extend(duplicates);

                let stats = catalog.stats();
                tracing::info!(
                    source = %source.describe(),
                    questions = stats.questions,
                    categories = stats.categories,
                    skipped = warnings.len(),
                    "Loaded question catalog"
                );
                let report = LoadReport {
                    questions: stats.questions,
                    categories: stats.categories,
                    warnings,
                };
                (Some(CatalogStore::new(catalog)), report)
            }
        };

        Ok(Self {
            source,
            sampler,
            catalog,
            report,
            writes: Mutex::new(()),
        })
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn get_all(&self) -> Result<Vec<Question>, ServiceError> {
        match &self.catalog {
            Some(catalog) => Ok(catalog.all().await),
            None => Ok(self.source.load_questions().await?.items),
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Question>, ServiceError> {
        tracing::debug!(id, "get_by_id");
        match &self.catalog {
            Some(catalog) => Ok(catalog.by_id(id).await),
            None => Ok(self.source.find_question(id).await?),
        }
    }

    /// Up to `count` distinct questions in random order.
    pub async fn get_random(&self, count: usize) -> Result<Vec<Question>, ServiceError> {
        let all = self.get_all().await?;
        Ok(self.sampler.sample(all, count))
    }

    /// Like [`get_random`](Self::get_random), restricted to one main
    /// category. An absent or blank name does not filter at all.
    pub async fn get_random_by_main_category(
        &self,
        name: Option<&str>,
        count: usize,
    ) -> Result<Vec<Question>, ServiceError> {
        let Some(normalized) = name.and_then(normalize_category) else {
            return self.get_random(count).await;
        };
        tracing::debug!(category = %normalized, count, "get_random_by_main_category");

        let candidates = match &self.catalog {
            Some(catalog) => catalog.by_main_category(&normalized).await,
            None => self.source.questions_in_main_category(&normalized).await?,
        };
        Ok(self.sampler.sample(candidates, count))
    }

    /// Answers of an answer category. Absent, blank and unknown names all
    /// give an empty list.
    pub async fn get_answers_by_category(
        &self,
        name: Option<&str>,
    ) -> Result<Vec<String>, ServiceError> {
        let Some(name) = name else {
            return Ok(Vec::new());
        };
        match &self.catalog {
            Some(catalog) => Ok(catalog.answers_for(name).await),
            None => Ok(self.source.category_answers(name).await?),
        }
    }

    /// Insert or wholly replace a question.
    ///
    /// For snapshot sources the catalog is updated first and stays updated
    /// even if writing through to the source fails; the error is still
    /// returned so the caller knows the record is not durable.
    pub async fn upsert(&self, question: Question) -> Result<Question, ServiceError> {
        question.validate()?;
        let _writes = self.writes.lock().await;

        let Some(catalog) = &self.catalog else {
            self.source.persist_question(&question).await?;
            tracing::info!(id = %question.id, "Upserted question");
            return Ok(question);
        };

        let stored = catalog.upsert(question).await?;
        if self.source.is_writable() {
            if let Err(e) = self.source.persist_question(&stored).await {
                tracing::error!(id = %stored.id, error = %e, "Question kept in memory but not persisted");
                return Err(e.into());
            }
        }
        tracing::info!(id = %stored.id, "Upserted question");
        Ok(stored)
    }

    /// Insert or replace an answer category, with the same write-through
    /// rules as [`upsert`](Self::upsert).
    pub async fn upsert_category(
        &self,
        category: AnswerCategory,
    ) -> Result<AnswerCategory, ServiceError> {
        let _writes = self.writes.lock().await;

        let Some(catalog) = &self.catalog else {
            self.source.persist_category(&category).await?;
            tracing::info!(name = %category.name, "Upserted category");
            return Ok(category);
        };

        let stored = catalog.upsert_category(category).await;
        if self.source.is_writable() {
            if let Err(e) = self.source.persist_category(&stored).await {
                tracing::error!(name = %stored.name, error = %e, "Category kept in memory but not persisted");
                return Err(e.into());
            }
        }
        tracing::info!(name = %stored.name, "Upserted category");
        Ok(stored)
    }

    pub async fn stats(&self) -> Result<CatalogStats, ServiceError> {
        match &self.catalog {
            Some(catalog) => Ok(catalog.stats().await),
            None => Ok(CatalogStats {
                questions: self.source.load_questions().await?.items.len(),
                categories: self.source.load_categories().await?.items.len(),
            }),
        }
    }

    /// Every question and category the service currently serves.
    pub async fn export(&self) -> Result<(Vec<Question>, Vec<AnswerCategory>), ServiceError> {
        match &self.catalog {
            Some(catalog) => {
                let snapshot = catalog.snapshot().await;
                Ok((snapshot.questions().to_vec(), snapshot.categories()))
            }
            None => Ok((
                self.source.load_questions().await?.items,
                self.source.load_categories().await?.items,
            )),
        }
    }
}

/// Copy everything `service` serves into the document store behind `pool`.
pub async fn import_into_store<S: QuestionSource>(
    service: &RetrievalService<S>,
    pool: &SqlitePool,
    force: bool,
) -> Result<ImportReport, ServiceError> {
    let (questions, categories) = service.export().await?;
    Ok(import_catalog(pool, &questions, &categories, force).await?)
}
