//! Persistence of canonical records, keyed by topic.
//!
//! Every backend stores the same owned graph (see [`records`]): one
//! [`StoredAnalysis`] per topic, owning at most one financial overview, which
//! owns its percent split and its two ordered child lists. Updates replace the
//! whole graph; nothing is patched in place.

pub mod arena;
pub mod postgres;
pub mod records;
pub mod schema;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::AnalysisCategory;
use crate::error::StoreError;
use crate::models::OrganizationAnalysis;

pub use arena::ArenaStore;
pub use postgres::PgAnalysisStore;
pub use records::{StoredAnalysis, StoredOverview};

/// History-view row: enough to list saved analyses without hydrating the
/// financial sub-graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAnalysisSummary {
    pub id: Uuid,
    pub topic: String,
    pub category: AnalysisCategory,
    pub lean_or_label: String,
    pub rating: i64,
    pub date_persisted: DateTime<Utc>,
}

/// Topic-keyed store of canonical records. Implementations serialize access
/// per instance so a same-topic `upsert` and `remove` never interleave.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Saves `analysis` under `topic`, replacing any existing record and its
    /// children. Returns `false` without saving when `topic` is blank.
    async fn upsert(&self, topic: &str, analysis: &OrganizationAnalysis) -> Result<bool, StoreError>;

    /// Deletes the record and its children. Returns whether one existed;
    /// removing an unknown topic is a no-op, not an error.
    async fn remove(&self, topic: &str) -> Result<bool, StoreError>;

    /// Summaries, newest save first.
    async fn list(&self) -> Result<Vec<SavedAnalysisSummary>, StoreError>;

    /// Rehydrates the full record saved under `topic`.
    async fn load(&self, topic: &str) -> Result<OrganizationAnalysis, StoreError>;

    async fn contains(&self, topic: &str) -> Result<bool, StoreError>;
}
