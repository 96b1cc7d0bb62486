use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use compass_analysis::category::AnalysisCategory;
use compass_analysis::error::StoreError;
use compass_analysis::models::{
    ContributionTotal, FinancialContributionsAnalysis, OrganizationAnalysis, PercentContributions,
};
use compass_analysis::store::{AnalysisStore, ArenaStore};

fn political(topic: &str) -> OrganizationAnalysis {
    OrganizationAnalysis {
        topic: topic.to_string(),
        lean_or_label: "Center".to_string(),
        rating: 3,
        description: "Balanced giving.".to_string(),
        category: AnalysisCategory::PoliticalLeaning,
        has_financial_contributions: true,
        financial_contributions_text: None,
        financial_overview: None,
    }
}

fn financial(topic: &str) -> OrganizationAnalysis {
    OrganizationAnalysis::financial(
        topic,
        FinancialContributionsAnalysis {
            summary_text: "Mostly Republican.".to_string(),
            committee_name: Some("ACME PAC".to_string()),
            committee_id: Some("C1".to_string()),
            percent_contributions: Some(PercentContributions {
                total_to_democrats: 100,
                total_to_republicans: 300,
                percent_to_democrats: 25.0,
                percent_to_republicans: 75.0,
                total_contributions: 400,
            }),
            contribution_totals: vec![
                ContributionTotal {
                    recipient_id: Some("R1".to_string()),
                    recipient_name: Some("First".to_string()),
                    number_of_contributions: Some(3),
                    total_contribution_amount: Some(10),
                },
                ContributionTotal {
                    recipient_id: Some("R2".to_string()),
                    recipient_name: None,
                    number_of_contributions: None,
                    total_contribution_amount: Some(90),
                },
            ],
            leadership_contributions: Vec::new(),
        },
    )
}

async fn read_snapshot(store: &ArenaStore) -> Vec<Value> {
    let path = store.snapshot_path().unwrap();
    let text = tokio::fs::read_to_string(path).await.unwrap();
    serde_json::from_str(&text).unwrap()
}

#[tokio::test]
async fn saved_graph_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    let store = ArenaStore::open(&path).await.unwrap();
    assert!(assert_ok!(store.upsert("Acme Corp", &financial("Acme Corp")).await));
    assert!(assert_ok!(store.upsert("Globex", &political("Globex")).await));
    drop(store);

    let reopened = ArenaStore::open(&path).await.unwrap();
    assert_eq!(reopened.load("Acme Corp").await.unwrap(), financial("Acme Corp"));
    assert_eq!(reopened.load("Globex").await.unwrap(), political("Globex"));

    let topics: Vec<_> = reopened.list().await.unwrap().into_iter().map(|s| s.topic).collect();
    assert_eq!(topics, vec!["Globex", "Acme Corp"]);

    // Sequence numbering continues after reopen.
    reopened.upsert("Initech", &political("Initech")).await.unwrap();
    assert_eq!(reopened.list().await.unwrap()[0].topic, "Initech");
}

#[tokio::test]
async fn replacing_a_financial_record_leaves_no_orphans() {
    let dir = TempDir::new().unwrap();
    let store = ArenaStore::open(dir.path().join("history.json")).await.unwrap();

    store.upsert("Acme Corp", &financial("Acme Corp")).await.unwrap();
    store.upsert("Acme Corp", &political("Acme Corp")).await.unwrap();

    let snapshot = read_snapshot(&store).await;
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot[0]["overview"].is_null());
    assert!(store.load("Acme Corp").await.unwrap().financial_overview.is_none());

    assert!(store.remove("Acme Corp").await.unwrap());
    assert!(read_snapshot(&store).await.is_empty());
}

#[tokio::test]
async fn malformed_records_are_skipped_on_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    let store = ArenaStore::open(&path).await.unwrap();
    store.upsert("Acme Corp", &political("Acme Corp")).await.unwrap();
    let mut snapshot = read_snapshot(&store).await;
    drop(store);

    snapshot.push(serde_json::json!({ "topic": "Broken", "rating": "not a record" }));
    snapshot.push(serde_json::json!(42));
    tokio::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).await.unwrap();

    let reopened = ArenaStore::open(&path).await.unwrap();
    let summaries = reopened.list().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].topic, "Acme Corp");
    assert!(!reopened.contains("Broken").await.unwrap());
}

#[tokio::test]
async fn unknown_persisted_category_loads_as_undefined() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    let store = ArenaStore::open(&path).await.unwrap();
    store.upsert("Acme Corp", &political("Acme Corp")).await.unwrap();
    let mut snapshot = read_snapshot(&store).await;
    drop(store);

    snapshot[0]["category"] = Value::String("Lunar Alignment".to_string());
    tokio::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).await.unwrap();

    let reopened = ArenaStore::open(&path).await.unwrap();
    assert_eq!(reopened.list().await.unwrap()[0].category, AnalysisCategory::Undefined);
    let loaded = reopened.load("Acme Corp").await.unwrap();
    assert_eq!(loaded.category, AnalysisCategory::Undefined);
    assert_eq!(loaded.rating, 3);
}

#[tokio::test]
async fn a_file_that_is_not_a_list_fails_to_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    tokio::fs::write(&path, b"{ \"not\": \"a list\" }").await.unwrap();

    match ArenaStore::open(&path).await {
        Err(StoreError::Snapshot(_)) => {}
        Err(other) => panic!("unexpected error: {:?}", other),
        Ok(_) => panic!("opened a snapshot that is not a list"),
    }
}

#[tokio::test]
async fn failed_write_keeps_the_previous_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing-dir").join("history.json");

    let store = ArenaStore::open(&path).await.unwrap();
    let err = assert_err!(store.upsert("Acme Corp", &political("Acme Corp")).await);
    assert!(matches!(err, StoreError::Io(_)), "{:?}", err);
    assert!(!store.contains("Acme Corp").await.unwrap());
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn maximal_sequence_in_snapshot_still_opens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    let store = ArenaStore::open(&path).await.unwrap();
    store.upsert("Acme Corp", &political("Acme Corp")).await.unwrap();
    store.upsert("Globex", &political("Globex")).await.unwrap();
    let mut snapshot = read_snapshot(&store).await;
    drop(store);

    snapshot[0]["sequence"] = Value::from(i64::MAX);
    tokio::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).await.unwrap();

    let reopened = ArenaStore::open(&path).await.unwrap();
    assert_eq!(reopened.list().await.unwrap().len(), 2);
    assert!(assert_ok!(reopened.upsert("Initech", &political("Initech")).await));
    assert!(assert_ok!(reopened.upsert("Initech", &financial("Initech")).await));
    assert_eq!(reopened.load("Initech").await.unwrap(), financial("Initech"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_to_one_topic_never_tear() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    let store = Arc::new(ArenaStore::open(&path).await.unwrap());

    let tasks = (0..60).map(|i| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            match i % 3 {
                0 => {
                    store.upsert("Acme", &financial("Acme")).await.unwrap();
                }
                1 => {
                    store.upsert("Acme", &political("Acme")).await.unwrap();
                }
                _ => {
                    store.remove("Acme").await.unwrap();
                }
            }
        })
    });
    for joined in join_all(tasks).await {
        joined.unwrap();
    }

    let in_memory = match store.load("Acme").await {
        Ok(analysis) => {
            assert!(analysis == financial("Acme") || analysis == political("Acme"));
            Some(analysis)
        }
        Err(StoreError::NotFound(_)) => None,
        Err(other) => panic!("unexpected error: {:?}", other),
    };

    let snapshot = read_snapshot(&store).await;
    let rows: Vec<&Value> = snapshot.iter().filter(|r| r["topic"] == "Acme").collect();
    assert!(rows.len() <= 1);
    if let Some(row) = rows.first() {
        if row["category"] != "Financial Contributions" {
            assert!(row["overview"].is_null());
        }
    }
    drop(store);

    let reopened = ArenaStore::open(&path).await.unwrap();
    assert_eq!(reopened.load("Acme").await.ok(), in_memory);
    assert_eq!(reopened.list().await.unwrap().len(), rows.len());
}
