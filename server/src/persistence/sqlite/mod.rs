//! SQLite-backed document store.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode**, allowing one writer and multiple concurrent readers.
//! - **Embedded migrations**: `sqlx::migrate!` runs `migrations/001_initial_schema.sql`
//!   when [`Database::open`] is called. The schema is idempotent.
//!
//! ## Collections
//!
//! Two tables act as document collections. `questions` stores each question
//! as a JSON document keyed by its lower-cased id, with the normalized main
//! category copied into an indexed column. `categories` stores the answer
//! list as a JSON array keyed by the normalized name.
//!
//! [`SqliteDocumentStore`] implements
//! [`QuestionSource`](crate::persistence::QuestionSource) with the live
//! strategy: every call is a query and nothing is cached.
//!
//! ## Import
//!
//! [`import_catalog`] copies a loaded catalog into an empty store in one
//! transaction. It is driven by the `import` command.

mod database;
mod document_store;
mod import;
#[cfg(test)]
mod integration_tests;

pub use database::Database;
pub use document_store::SqliteDocumentStore;
pub use import::{import_catalog, ImportReport};
