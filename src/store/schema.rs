use anyhow::{Context, Result};
use log::info;
use tokio_postgres::Client;

pub const STORE_SCHEMA: &str = "compass_ai";

/// Tables in dependency order. Children cascade from their owner so deleting a
/// `query_answer` row removes the whole graph.
const TABLES: [(&str, &str); 5] = [
    (
        "query_answer",
        r#"
        id UUID PRIMARY KEY,
        seq BIGSERIAL NOT NULL,
        topic TEXT NOT NULL UNIQUE,
        lean TEXT NOT NULL,
        rating BIGINT NOT NULL,
        context TEXT NOT NULL,
        category TEXT NOT NULL,
        created_with_financial_contributions_info BOOLEAN NOT NULL,
        financial_contributions_text TEXT,
        date_persisted TIMESTAMPTZ NOT NULL
        "#,
    ),
    (
        "financial_contributions_overview",
        r#"
        id UUID PRIMARY KEY,
        query_answer_id UUID NOT NULL UNIQUE
            REFERENCES {schema}.query_answer(id) ON DELETE CASCADE,
        summary_text TEXT NOT NULL,
        committee_name TEXT,
        committee_id TEXT
        "#,
    ),
    (
        "percent_contributions",
        r#"
        overview_id UUID PRIMARY KEY
            REFERENCES {schema}.financial_contributions_overview(id) ON DELETE CASCADE,
        total_to_democrats BIGINT NOT NULL,
        total_to_republicans BIGINT NOT NULL,
        percent_to_democrats DOUBLE PRECISION NOT NULL,
        percent_to_republicans DOUBLE PRECISION NOT NULL,
        total_contributions BIGINT NOT NULL
        "#,
    ),
    (
        "contribution_total_item",
        r#"
        overview_id UUID NOT NULL
            REFERENCES {schema}.financial_contributions_overview(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        recipient_id TEXT,
        recipient_name TEXT,
        number_of_contributions BIGINT,
        total_contribution_amount BIGINT,
        PRIMARY KEY (overview_id, position)
        "#,
    ),
    (
        "leadership_contribution_item",
        r#"
        overview_id UUID NOT NULL
            REFERENCES {schema}.financial_contributions_overview(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        occupation TEXT NOT NULL,
        name TEXT NOT NULL,
        employer TEXT NOT NULL,
        transaction_amount TEXT NOT NULL,
        PRIMARY KEY (overview_id, position)
        "#,
    ),
];

/// Creates the store schema and its tables if they do not already exist.
pub async fn create_store_schema(client: &Client) -> Result<()> {
    info!("Ensuring store schema '{}' exists...", STORE_SCHEMA);
    let query = format!("CREATE SCHEMA IF NOT EXISTS {};", STORE_SCHEMA);
    client
        .execute(&query, &[])
        .await
        .context(format!("Failed to create schema {}", STORE_SCHEMA))?;

    for (table_name, columns) in TABLES {
        let create_query = format!(
            "CREATE TABLE IF NOT EXISTS {}.{} ({});",
            STORE_SCHEMA,
            table_name,
            columns.replace("{schema}", STORE_SCHEMA)
        );
        client
            .execute(&create_query, &[])
            .await
            .context(format!("Failed to create table {}.{}", STORE_SCHEMA, table_name))?;
    }

    let index_query = format!(
        "CREATE INDEX IF NOT EXISTS query_answer_date_persisted_idx ON {}.query_answer (date_persisted DESC, seq DESC);",
        STORE_SCHEMA
    );
    client
        .execute(&index_query, &[])
        .await
        .context("Failed to create history index")?;

    info!("Schema '{}' ensured with {} tables.", STORE_SCHEMA, TABLES.len());
    Ok(())
}
