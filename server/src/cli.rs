//! Command-line front end over the retrieval service.
//!
//! Every command prints its result as JSON on stdout; logs go elsewhere.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use quiz::{AnswerCategory, Question};
use serde_json::Value;

use crate::config::Backend;
use crate::persistence::QuestionSource;
use crate::service::RetrievalService;

#[derive(Parser)]
#[command(name = "tens10n-server", about = "Quiz question and answer category catalog")]
pub struct Cli {
    /// Source backend. Overrides TENS10N_BACKEND.
    #[arg(long, value_enum, global = true)]
    pub backend: Option<Backend>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Print every question.
    List,
    /// Print one question, looked up case-insensitively.
    Get { id: String },
    /// Print random questions, optionally from one main category.
    Random {
        #[arg(short, long, default_value_t = 5)]
        count: usize,
        #[arg(short = 'g', long)]
        category: Option<String>,
    },
    /// Print the answers of an answer category.
    Answers { category: String },
    /// Insert or replace the question stored in a JSON file.
    Upsert { file: PathBuf },
    /// Insert or replace an answer category from a JSON array file.
    PutCategory { name: String, file: PathBuf },
    /// Print question and category counts.
    Stats,
    /// Copy a file-based catalog into the SQLite document store.
    Import {
        #[arg(long, value_enum, default_value_t = ImportFrom::Bundle)]
        from: ImportFrom,
        /// Upsert even when the store already holds data.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportFrom {
    Bundle,
    Directory,
}

/// Run one service command and return its JSON output. `import` is not a
/// service command and is handled by the caller.
pub async fn execute<S: QuestionSource>(
    service: &RetrievalService<S>,
    command: &Commands,
) -> anyhow::Result<Value> {
    let output = match command {
        Commands::List => serde_json::to_value(service.get_all().await?)?,
        Commands::Get { id } => {
            let question = service
                .get_by_id(id)
                .await?
                .ok_or_else(|| anyhow!("no question with id {id:?}"))?;
            serde_json::to_value(question)?
        }
        Commands::Random { count, category } => serde_json::to_value(
            service
                .get_random_by_main_category(category.as_deref(), *count)
                .await?,
        )?,
        Commands::Answers { category } => {
            serde_json::to_value(service.get_answers_by_category(Some(category.as_str())).await?)?
        }
        Commands::Upsert { file } => {
            let question: Question = read_json(file)?;
            serde_json::to_value(service.upsert(question).await?)?
        }
        Commands::PutCategory { name, file } => {
            let answers: Vec<String> = read_json(file)?;
            let category = AnswerCategory::new(name, answers)?;
            serde_json::to_value(service.upsert_category(category).await?)?
        }
        Commands::Stats => serde_json::to_value(service.stats().await?)?,
        Commands::Import { .. } => {
            return Err(anyhow!("import is not served by a running catalog"));
        }
    };
    Ok(output)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}
