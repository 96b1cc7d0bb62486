//! In-process store: an owned map from topic to record graph, optionally
//! mirrored to a JSON snapshot file.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::OrganizationAnalysis;
use crate::store::records::StoredAnalysis;
use crate::store::{AnalysisStore, SavedAnalysisSummary};

#[derive(Default)]
struct ArenaState {
    records: HashMap<String, StoredAnalysis>,
    next_sequence: i64,
}

/// All operations run under one async mutex, so each store instance has a
/// single serialized access context.
pub struct ArenaStore {
    state: Mutex<ArenaState>,
    snapshot_path: Option<PathBuf>,
}

impl ArenaStore {
    /// A store that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(ArenaState::default()),
            snapshot_path: None,
        }
    }

    /// Opens (or starts) a store mirrored to `path`. Individual records that
    /// fail to parse are skipped with a warning; a file that is not a JSON
    /// array at all is an error.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut state = ArenaState::default();

        if tokio::fs::try_exists(&path).await? {
            let text = tokio::fs::read_to_string(&path).await?;
            let raw: Vec<Value> = if text.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&text)?
            };

            for (index, value) in raw.into_iter().enumerate() {
                match serde_json::from_value::<StoredAnalysis>(value) {
                    Ok(record) => {
                        state.next_sequence = state.next_sequence.max(record.sequence.saturating_add(1));
                        let keep = match state.records.get(&record.topic) {
                            Some(existing) => existing.sequence < record.sequence,
                            None => true,
                        };
                        if keep {
                            state.records.insert(record.topic.clone(), record);
                        }
                    }
                    Err(e) => warn!(
                        "Skipping unreadable saved analysis #{} in {:?}: {}",
                        index, path, e
                    ),
                }
            }
            info!("Loaded {} saved analyses from {:?}", state.records.len(), path);
        } else {
            info!("No saved analyses at {:?}, starting empty", path);
        }

        Ok(Self {
            state: Mutex::new(state),
            snapshot_path: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Writes the whole map to a sibling temp file, then renames it over the
    /// snapshot so readers never see a half-written file.
    async fn flush(&self, state: &ArenaState) -> Result<(), StoreError> {
        let Some(ref path) = self.snapshot_path else {
            return Ok(());
        };

        let mut records: Vec<&StoredAnalysis> = state.records.values().collect();
        records.sort_by_key(|r| r.sequence);
        let body = serde_json::to_vec_pretty(&records)?;

        let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, &body).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        debug!("Wrote {} saved analyses to {:?}", records.len(), path);
        Ok(())
    }
}

#[async_trait]
impl AnalysisStore for ArenaStore {
    async fn upsert(&self, topic: &str, analysis: &OrganizationAnalysis) -> Result<bool, StoreError> {
        if topic.trim().is_empty() {
            return Ok(false);
        }

        let mut state = self.state.lock().await;
        let record = StoredAnalysis::from_analysis(topic, analysis, state.next_sequence, Utc::now());
        let previous = state.records.insert(topic.to_string(), record);

        if let Err(e) = self.flush(&state).await {
            match previous {
                Some(previous) => {
                    state.records.insert(topic.to_string(), previous);
                }
                None => {
                    state.records.remove(topic);
                }
            }
            return Err(e);
        }

        state.next_sequence = state.next_sequence.saturating_add(1);
        info!(
            "Saved {} analysis for '{}'{}",
            analysis.category,
            topic,
            if previous.is_some() { " (replaced)" } else { "" }
        );
        Ok(true)
    }

    async fn remove(&self, topic: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(removed) = state.records.remove(topic) else {
            debug!("Nothing saved for '{}', remove is a no-op", topic);
            return Ok(false);
        };

        if let Err(e) = self.flush(&state).await {
            state.records.insert(topic.to_string(), removed);
            return Err(e);
        }
        info!("Removed saved analysis for '{}'", topic);
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<SavedAnalysisSummary>, StoreError> {
        let state = self.state.lock().await;
        let mut records: Vec<&StoredAnalysis> = state.records.values().collect();
        records.sort_by(|a, b| {
            b.date_persisted
                .cmp(&a.date_persisted)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        Ok(records.into_iter().map(StoredAnalysis::summary).collect())
    }

    async fn load(&self, topic: &str) -> Result<OrganizationAnalysis, StoreError> {
        let state = self.state.lock().await;
        state
            .records
            .get(topic)
            .cloned()
            .map(StoredAnalysis::into_analysis)
            .ok_or_else(|| StoreError::NotFound(topic.to_string()))
    }

    async fn contains(&self, topic: &str) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.records.contains_key(topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::AnalysisCategory;
    use crate::models::{FinancialContributionsAnalysis, LeadershipContribution};

    fn scored(topic: &str, rating: i64) -> OrganizationAnalysis {
        OrganizationAnalysis {
            topic: topic.to_string(),
            lean_or_label: AnalysisCategory::Wokeness.rating_label(rating),
            rating,
            description: "context".to_string(),
            category: AnalysisCategory::Wokeness,
            has_financial_contributions: false,
            financial_contributions_text: None,
            financial_overview: None,
        }
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
                leadership_contributions: vec![LeadershipContribution {
                    occupation: "CEO".to_string(),
                    name: "DOE, JANE".to_string(),
                    employer: "ACME".to_string(),
                    transaction_amount: "5000".to_string(),
                }],
            },
        )
    }

    #[tokio::test]
    async fn second_upsert_replaces_the_whole_graph() {
        let store = ArenaStore::in_memory();
        assert!(store.upsert("Acme Corp", &financial("Acme Corp")).await.unwrap());
        let replacement = scored("Acme Corp", 2);
        assert!(store.upsert("Acme Corp", &replacement).await.unwrap());

        let loaded = store.load("Acme Corp").await.unwrap();
        assert_eq!(loaded, replacement);
        assert!(loaded.financial_overview.is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn removing_an_unknown_topic_is_a_no_op() {
        let store = ArenaStore::in_memory();
        assert!(!store.remove("Nobody Inc").await.unwrap());

        store.upsert("Acme Corp", &scored("Acme Corp", 3)).await.unwrap();
        assert!(store.remove("Acme Corp").await.unwrap());
        assert!(!store.remove("Acme Corp").await.unwrap());
        assert!(!store.contains("Acme Corp").await.unwrap());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = ArenaStore::in_memory();
        store.upsert("T1", &scored("T1", 1)).await.unwrap();
        store.upsert("T2", &scored("T2", 2)).await.unwrap();
        let topics: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.topic).collect();
        assert_eq!(topics, vec!["T2", "T1"]);

        // Re-saving moves a topic back to the front.
        store.upsert("T1", &scored("T1", 4)).await.unwrap();
        let topics: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.topic).collect();
        assert_eq!(topics, vec!["T1", "T2"]);
    }

    #[tokio::test]
    async fn load_of_missing_topic_is_not_found() {
        let store = ArenaStore::in_memory();
        let err = store.load("Acme Corp").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref t) if t == "Acme Corp"));
    }

    #[tokio::test]
    async fn blank_topic_is_not_saved() {
        let store = ArenaStore::in_memory();
        assert!(!store.upsert("  ", &scored("  ", 1)).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn topics_are_case_sensitive() {
        let store = ArenaStore::in_memory();
        store.upsert("Acme", &scored("Acme", 1)).await.unwrap();
        store.upsert("ACME", &scored("ACME", 5)).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);
        assert_eq!(store.load("ACME").await.unwrap().rating, 5);
    }
}
