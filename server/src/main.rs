mod catalog;
mod cli;
mod config;
mod persistence;
mod service;

use clap::Parser;
use quiz::Sampler;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands, ImportFrom};
use config::Backend;
use persistence::{BundleSource, Database, DirectorySource, QuestionSource, SqliteDocumentStore};
use service::RetrievalService;

/// Logs go to stderr so stdout carries only command output. With a log
/// directory configured they go to a daily rolling file instead.
fn init_tracing() -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_dir) = config::get_log_dir() else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "tens10n-server");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing()?;

    if let Commands::Import { from, force } = cli.command {
        return import(from, force).await;
    }

    let backend = cli.backend.unwrap_or_else(config::get_backend);
    tracing::info!(?backend, "Starting tens10n server");

    match backend {
        Backend::Bundle => run(BundleSource::open(config::get_bundle_path()), &cli.command).await,
        Backend::Directory => run(DirectorySource::new(config::get_data_dir()), &cli.command).await,
        Backend::Sqlite => {
            let db = Database::open(&config::get_db_path()).await?;
            let store = SqliteDocumentStore::new(db.pool().clone(), config::get_db_timeout());
            run(store, &cli.command).await
        }
    }
}

async fn open_service<S: QuestionSource>(source: S) -> anyhow::Result<RetrievalService<S>> {
    let service = RetrievalService::open(source, Sampler::from_entropy()).await?;
    let report = service.load_report();
    let skipped = report.warnings.len();
    tracing::debug!(
        source = %service.source().describe(),
        questions = report.questions,
        categories = report.categories,
        skipped,
        "Catalog ready"
    );
    if skipped > 0 && config::get_strict_load() {
        anyhow::bail!("{skipped} records were skipped while loading and strict loading is on");
    }
    Ok(service)
}

async fn run<S: QuestionSource>(source: S, command: &Commands) -> anyhow::Result<()> {
    let service = open_service(source).await?;
    let output = cli::execute(&service, command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn import(from: ImportFrom, force: bool) -> anyhow::Result<()> {
    let db = Database::open(&config::get_db_path()).await?;
    let report = match from {
        ImportFrom::Bundle => {
            let service = open_service(BundleSource::open(config::get_bundle_path())).await?;
            service::import_into_store(&service, db.pool(), force).await?
        }
        ImportFrom::Directory => {
            let service = open_service(DirectorySource::new(config::get_data_dir())).await?;
            service::import_into_store(&service, db.pool(), force).await?
        }
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
