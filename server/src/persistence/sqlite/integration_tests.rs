//! The same data served through every backend must look the same to callers.

use std::path::Path;
use std::time::Duration;

use quiz::{AnswerCategory, Question, Sampler};

use super::{Database, SqliteDocumentStore};
use crate::persistence::{BundleSource, DirectorySource, QuestionSource};
use crate::service::{import_into_store, RetrievalService};

fn write_bundle(root: &Path) {
    std::fs::create_dir_all(root.join("questions")).unwrap();
    std::fs::create_dir_all(root.join("categories")).unwrap();
    std::fs::write(
        root.join("questions/q1.json"),
        r#"{"questionId": "Q1", "title": "Capitals", "mainCategory": "Geo",
            "numTensionAnswers": 1, "answers": {"1": "Oslo"},
            "tensionAnswers": {"1": "Paris"}, "answersCategory": "cities"}"#,
    )
    .unwrap();
    std::fs::write(
        root.join("questions/q2.json"),
        r#"{"questionId": "q2", "title": "Wars", "mainCategory": "History"}"#,
    )
    .unwrap();
    std::fs::write(root.join("questions/broken.json"), "{").unwrap();
    std::fs::write(
        root.join("categories/cities.json"),
        r#"["Oslo", "Bergen", "Oslo"]"#,
    )
    .unwrap();
}

async fn check_contract<S: QuestionSource>(service: &RetrievalService<S>) {
    let all = service.get_all().await.unwrap();
    let ids: Vec<&str> = all.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["Q1", "q2"]);

    let q1 = service.get_by_id("q1").await.unwrap().unwrap();
    assert_eq!(q1.answers_category.as_deref(), Some("cities"));
    assert_eq!(q1.tension_answers["1"], "Paris");

    let geo = service
        .get_random_by_main_category(Some("GEO"), 5)
        .await
        .unwrap();
    assert_eq!(geo.len(), 1);
    assert_eq!(geo[0].id, "Q1");

    assert_eq!(
        service.get_answers_by_category(Some(" Cities")).await.unwrap(),
        vec!["Oslo", "Bergen", "Oslo"]
    );
    assert_eq!(service.get_random(10).await.unwrap().len(), 2);
}

async fn check_upsert<S: QuestionSource>(service: &RetrievalService<S>) {
    service
        .upsert(Question::new("q1", "Capitals").with_main_category("History"))
        .await
        .unwrap();
    assert!(service
        .get_random_by_main_category(Some("geo"), 5)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(service.get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn bundle_directory_serves_contract() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path());

    let service = RetrievalService::open(BundleSource::open(dir.path()), Sampler::seeded(1))
        .await
        .unwrap();

    assert_eq!(service.load_report().warnings.len(), 1);
    check_contract(&service).await;
    check_upsert(&service).await;
}

#[tokio::test]
async fn data_directory_serves_contract_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path());

    let service = RetrievalService::open(DirectorySource::new(dir.path()), Sampler::seeded(1))
        .await
        .unwrap();
    check_contract(&service).await;
    check_upsert(&service).await;

    let reopened = RetrievalService::open(DirectorySource::new(dir.path()), Sampler::seeded(1))
        .await
        .unwrap();
    let q1 = reopened.get_by_id("Q1").await.unwrap().unwrap();
    assert_eq!(q1.main_category.as_deref(), Some("History"));
    assert_eq!(reopened.get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn imported_store_serves_contract() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path());
    let bundle = RetrievalService::open(BundleSource::open(dir.path()), Sampler::seeded(1))
        .await
        .unwrap();

    let db = Database::new_in_memory().await.unwrap();
    let report = import_into_store(&bundle, db.pool(), false).await.unwrap();
    assert_eq!(report.questions, 2);
    assert_eq!(report.categories, 1);

    let store = SqliteDocumentStore::new(db.pool().clone(), Duration::from_secs(5));
    let service = RetrievalService::open(store, Sampler::seeded(1)).await.unwrap();
    check_contract(&service).await;
    check_upsert(&service).await;

    service
        .upsert_category(AnswerCategory::new("Rivers", vec!["Nile".into()]).unwrap())
        .await
        .unwrap();
    assert_eq!(service.stats().await.unwrap().categories, 2);
}
