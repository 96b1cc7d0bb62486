//! PostgreSQL-backed store.
//!
//! Writes run in one transaction holding a transaction-scoped advisory lock on
//! the topic, so same-topic `upsert`/`remove` calls are linearized and a
//! failed write rolls back without leaving a partial graph.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio_postgres::{IsolationLevel, Row, Transaction};
use uuid::Uuid;

use crate::category::AnalysisCategory;
use crate::db_connect::{self, PgPool, PoolOptions};
use crate::error::StoreError;
use crate::models::{OrganizationAnalysis, PercentContributions};
use crate::store::records::{
    StoredAnalysis, StoredContributionTotal, StoredLeadershipContribution, StoredOverview,
};
use crate::store::schema::{create_store_schema, STORE_SCHEMA};
use crate::store::{AnalysisStore, SavedAnalysisSummary};

pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    /// Wraps an existing pool, creating the schema if needed.
    pub async fn new(pool: PgPool) -> anyhow::Result<Self> {
        let client = pool
            .get()
            .await
            .context("Failed to get DB client for schema setup")?;
        create_store_schema(&client).await?;
        drop(client);
        Ok(Self { pool })
    }

    /// Connects using the `POSTGRES_*` environment variables.
    pub async fn connect(options: &PoolOptions) -> anyhow::Result<Self> {
        let pool = db_connect::connect(options).await?;
        let (total, idle, in_use) = db_connect::get_pool_status(&pool);
        info!(
            "Store pool ready: {} connections ({} idle, {} in use)",
            total, idle, in_use
        );
        Self::new(pool).await
    }
}

async fn lock_topic(tx: &Transaction<'_>, topic: &str) -> Result<(), StoreError> {
    tx.execute("SELECT pg_advisory_xact_lock(hashtext($1))", &[&topic])
        .await?;
    Ok(())
}

async fn insert_graph(tx: &Transaction<'_>, record: &StoredAnalysis) -> Result<(), StoreError> {
    tx.execute(
        &format!(
            r#"
            INSERT INTO {}.query_answer
                (id, topic, lean, rating, context, category,
                 created_with_financial_contributions_info, financial_contributions_text, date_persisted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
            STORE_SCHEMA
        ),
        &[
            &record.id,
            &record.topic,
            &record.lean,
            &record.rating,
            &record.context,
            &record.category,
            &record.created_with_financial_contributions_info,
            &record.financial_contributions_text,
            &record.date_persisted,
        ],
    )
    .await?;

    let Some(ref overview) = record.overview else {
        return Ok(());
    };

    tx.execute(
        &format!(
            "INSERT INTO {}.financial_contributions_overview (id, query_answer_id, summary_text, committee_name, committee_id) VALUES ($1, $2, $3, $4, $5)",
            STORE_SCHEMA
        ),
        &[
            &overview.id,
            &record.id,
            &overview.summary_text,
            &overview.committee_name,
            &overview.committee_id,
        ],
    )
    .await?;

    if let Some(ref percent) = overview.percent_contributions {
        tx.execute(
            &format!(
                r#"
                INSERT INTO {}.percent_contributions
                    (overview_id, total_to_democrats, total_to_republicans,
                     percent_to_democrats, percent_to_republicans, total_contributions)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
                STORE_SCHEMA
            ),
            &[
                &overview.id,
                &percent.total_to_democrats,
                &percent.total_to_republicans,
                &percent.percent_to_democrats,
                &percent.percent_to_republicans,
                &percent.total_contributions,
            ],
        )
        .await?;
    }

    let total_insert = format!(
        r#"
        INSERT INTO {}.contribution_total_item
            (overview_id, position, recipient_id, recipient_name, number_of_contributions, total_contribution_amount)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
        STORE_SCHEMA
    );
    let total_stmt = tx.prepare(&total_insert).await?;
    for item in &overview.contribution_totals {
        tx.execute(
            &total_stmt,
            &[
                &overview.id,
                &item.position,
                &item.recipient_id,
                &item.recipient_name,
                &item.number_of_contributions,
                &item.total_contribution_amount,
            ],
        )
        .await?;
    }

    let leadership_insert = format!(
        r#"
        INSERT INTO {}.leadership_contribution_item
            (overview_id, position, occupation, name, employer, transaction_amount)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
        STORE_SCHEMA
    );
    let leadership_stmt = tx.prepare(&leadership_insert).await?;
    for item in &overview.leadership_contributions {
        tx.execute(
            &leadership_stmt,
            &[
                &overview.id,
                &item.position,
                &item.occupation,
                &item.name,
                &item.employer,
                &item.transaction_amount,
            ],
        )
        .await?;
    }

    debug!(
        "Inserted overview for '{}' with {} totals and {} leadership rows",
        record.topic,
        overview.contribution_totals.len(),
        overview.leadership_contributions.len()
    );
    Ok(())
}

fn stored_analysis_from_row(row: &Row) -> Result<StoredAnalysis, StoreError> {
    Ok(StoredAnalysis {
        id: row.try_get("id")?,
        sequence: row.try_get("seq")?,
        topic: row.try_get("topic")?,
        lean: row.try_get("lean")?,
        rating: row.try_get("rating")?,
        context: row.try_get("context")?,
        category: row.try_get("category")?,
        created_with_financial_contributions_info: row
            .try_get("created_with_financial_contributions_info")?,
        financial_contributions_text: row.try_get("financial_contributions_text")?,
        date_persisted: row.try_get("date_persisted")?,
        overview: None,
    })
}

async fn load_overview(tx: &Transaction<'_>, query_answer_id: Uuid) -> Result<Option<StoredOverview>, StoreError> {
    let Some(row) = tx
        .query_opt(
            &format!(
                "SELECT id, summary_text, committee_name, committee_id FROM {}.financial_contributions_overview WHERE query_answer_id = $1",
                STORE_SCHEMA
            ),
            &[&query_answer_id],
        )
        .await?
    else {
        return Ok(None);
    };
    let overview_id: Uuid = row.try_get("id")?;

    let percent_contributions = tx
        .query_opt(
            &format!(
                r#"
                SELECT total_to_democrats, total_to_republicans, percent_to_democrats,
                       percent_to_republicans, total_contributions
                FROM {}.percent_contributions WHERE overview_id = $1
                "#,
                STORE_SCHEMA
            ),
            &[&overview_id],
        )
        .await?
        .map(|p| -> Result<PercentContributions, StoreError> {
            Ok(PercentContributions {
                total_to_democrats: p.try_get("total_to_democrats")?,
                total_to_republicans: p.try_get("total_to_republicans")?,
                percent_to_democrats: p.try_get("percent_to_democrats")?,
                percent_to_republicans: p.try_get("percent_to_republicans")?,
                total_contributions: p.try_get("total_contributions")?,
            })
        })
        .transpose()?;

    let mut contribution_totals = Vec::new();
    for item in tx
        .query(
            &format!(
                r#"
                SELECT position, recipient_id, recipient_name, number_of_contributions, total_contribution_amount
                FROM {}.contribution_total_item WHERE overview_id = $1 ORDER BY position
                "#,
                STORE_SCHEMA
            ),
            &[&overview_id],
        )
        .await?
    {
        contribution_totals.push(StoredContributionTotal {
            position: item.try_get("position")?,
            recipient_id: item.try_get("recipient_id")?,
            recipient_name: item.try_get("recipient_name")?,
            number_of_contributions: item.try_get("number_of_contributions")?,
            total_contribution_amount: item.try_get("total_contribution_amount")?,
        });
    }

    let mut leadership_contributions = Vec::new();
    for item in tx
        .query(
            &format!(
                r#"
                SELECT position, occupation, name, employer, transaction_amount
                FROM {}.leadership_contribution_item WHERE overview_id = $1 ORDER BY position
                "#,
                STORE_SCHEMA
            ),
            &[&overview_id],
        )
        .await?
    {
        leadership_contributions.push(StoredLeadershipContribution {
            position: item.try_get("position")?,
            occupation: item.try_get("occupation")?,
            name: item.try_get("name")?,
            employer: item.try_get("employer")?,
            transaction_amount: item.try_get("transaction_amount")?,
        });
    }

    Ok(Some(StoredOverview {
        id: overview_id,
        summary_text: row.try_get("summary_text")?,
        committee_name: row.try_get("committee_name")?,
        committee_id: row.try_get("committee_id")?,
        percent_contributions,
        contribution_totals,
        leadership_contributions,
    }))
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn upsert(&self, topic: &str, analysis: &OrganizationAnalysis) -> Result<bool, StoreError> {
        if topic.trim().is_empty() {
            return Ok(false);
        }

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        lock_topic(&tx, topic).await?;

        let replaced = tx
            .execute(
                &format!("DELETE FROM {}.query_answer WHERE topic = $1", STORE_SCHEMA),
                &[&topic],
            )
            .await?;
        let record = StoredAnalysis::from_analysis(topic, analysis, 0, Utc::now());
        insert_graph(&tx, &record).await?;
        tx.commit().await?;

        info!(
            "Saved {} analysis for '{}'{}",
            analysis.category,
            topic,
            if replaced > 0 { " (replaced)" } else { "" }
        );
        Ok(true)
    }

    async fn remove(&self, topic: &str) -> Result<bool, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        lock_topic(&tx, topic).await?;
        let deleted = tx
            .execute(
                &format!("DELETE FROM {}.query_answer WHERE topic = $1", STORE_SCHEMA),
                &[&topic],
            )
            .await?;
        tx.commit().await?;

        if deleted == 0 {
            debug!("Nothing saved for '{}', remove is a no-op", topic);
        } else {
            info!("Removed saved analysis for '{}'", topic);
        }
        Ok(deleted > 0)
    }

    async fn list(&self) -> Result<Vec<SavedAnalysisSummary>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!(
                    r#"
                    SELECT id, topic, category, lean, rating, date_persisted
                    FROM {}.query_answer
                    ORDER BY date_persisted DESC, seq DESC
                    "#,
                    STORE_SCHEMA
                ),
                &[],
            )
            .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let category: String = row.try_get("category")?;
            let date_persisted: DateTime<Utc> = row.try_get("date_persisted")?;
            summaries.push(SavedAnalysisSummary {
                id: row.try_get("id")?,
                topic: row.try_get("topic")?,
                category: AnalysisCategory::from_stored(&category),
                lean_or_label: row.try_get("lean")?,
                rating: row.try_get("rating")?,
                date_persisted,
            });
        }
        Ok(summaries)
    }

    async fn load(&self, topic: &str) -> Result<OrganizationAnalysis, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client
            .build_transaction()
            .isolation_level(IsolationLevel::RepeatableRead)
            .read_only(true)
            .start()
            .await?;

        let row = tx
            .query_opt(
                &format!(
                    r#"
                    SELECT id, seq, topic, lean, rating, context, category,
                           created_with_financial_contributions_info, financial_contributions_text, date_persisted
                    FROM {}.query_answer WHERE topic = $1
                    "#,
                    STORE_SCHEMA
                ),
                &[&topic],
            )
            .await?
            .ok_or_else(|| StoreError::NotFound(topic.to_string()))?;

        let mut record = stored_analysis_from_row(&row)?;
        record.overview = load_overview(&tx, record.id).await?;
        tx.commit().await?;
        Ok(record.into_analysis())
    }

    async fn contains(&self, topic: &str) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                &format!(
                    "SELECT EXISTS (SELECT 1 FROM {}.query_answer WHERE topic = $1)",
                    STORE_SCHEMA
                ),
                &[&topic],
            )
            .await?;
        Ok(row.try_get(0)?)
    }
}
