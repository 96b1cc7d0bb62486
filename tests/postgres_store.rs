//! Runs against a live database. Set `COMPASS_TEST_POSTGRES=1` plus the usual
//! `POSTGRES_*` variables to enable.

use compass_analysis::category::AnalysisCategory;
use compass_analysis::db_connect::PoolOptions;
use compass_analysis::error::StoreError;
use compass_analysis::models::{FinancialContributionsAnalysis, LeadershipContribution, OrganizationAnalysis};
use compass_analysis::store::{AnalysisStore, PgAnalysisStore};

async fn store_or_skip() -> Option<PgAnalysisStore> {
    if std::env::var("COMPASS_TEST_POSTGRES").is_err() {
        eprintln!("COMPASS_TEST_POSTGRES not set, skipping");
        return None;
    }
    Some(PgAnalysisStore::connect(&PoolOptions::default()).await.unwrap())
}

fn unique_topic(name: &str) -> String {
    format!("{} {}", name, uuid::Uuid::new_v4())
}

fn financial(topic: &str) -> OrganizationAnalysis {
    OrganizationAnalysis::financial(
        topic,
        FinancialContributionsAnalysis {
            summary_text: "Summary".to_string(),
            committee_name: None,
            committee_id: Some("C1".to_string()),
            percent_contributions: None,
            contribution_totals: Vec::new(),
            leadership_contributions: vec![
                LeadershipContribution {
                    occupation: "CEO".to_string(),
                    name: "DOE, JANE".to_string(),
                    employer: "ACME".to_string(),
                    transaction_amount: "5000".to_string(),
                },
                LeadershipContribution {
                    occupation: "CFO".to_string(),
                    name: "ROE, RICH".to_string(),
                    employer: "ACME".to_string(),
                    transaction_amount: "abc".to_string(),
                },
            ],
        },
    )
}

fn scored(topic: &str) -> OrganizationAnalysis {
    OrganizationAnalysis {
        topic: topic.to_string(),
        lean_or_label: AnalysisCategory::EnvironmentalImpact.rating_label(4),
        rating: 4,
        description: "context".to_string(),
        category: AnalysisCategory::EnvironmentalImpact,
        has_financial_contributions: false,
        financial_contributions_text: None,
        financial_overview: None,
    }
}

#[tokio::test]
async fn upsert_load_replace_remove() {
    let Some(store) = store_or_skip().await else {
        return;
    };
    let topic = unique_topic("Acme Corp");

    assert!(store.upsert(&topic, &financial(&topic)).await.unwrap());
    assert!(store.contains(&topic).await.unwrap());
    assert_eq!(store.load(&topic).await.unwrap(), financial(&topic));

    assert!(store.upsert(&topic, &scored(&topic)).await.unwrap());
    let loaded = store.load(&topic).await.unwrap();
    assert_eq!(loaded, scored(&topic));
    assert_eq!(
        store.list().await.unwrap().iter().filter(|s| s.topic == topic).count(),
        1
    );

    assert!(store.remove(&topic).await.unwrap());
    assert!(!store.remove(&topic).await.unwrap());
    assert!(matches!(store.load(&topic).await, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn blank_topic_is_not_saved() {
    let Some(store) = store_or_skip().await else {
        return;
    };
    assert!(!store.upsert(" ", &scored(" ")).await.unwrap());
}
