//! Response bodies as the analysis service sends them.

use serde::{Deserialize, Serialize};

use crate::flexible::{deserialize_lenient, deserialize_lenient_i64, deserialize_opt_i64, FlexibleInt};
use crate::models::{ContributionTotal, LeadershipContribution, PercentContributions};

/// Timestamps arrive as epoch seconds on some endpoints and as text on others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    #[serde(default)]
    pub persisted_response: bool,
    #[serde(default)]
    pub newly_generated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseErrorInfo {
    pub error: Option<bool>,
    pub message: Option<String>,
}

/// Optional fields only present on the flat (top-level) envelope. Each field
/// decodes on its own: a malformed value drops only that field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub timestamp: Option<Timestamp>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub normalized_topic_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub citation: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub upvote_count: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub downvote_count: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub query_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub debug: Option<DebugInfo>,
    #[serde(default, rename = "response_error", deserialize_with = "deserialize_lenient")]
    pub error: Option<ResponseErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialDebugInfo {
    pub model_used: Option<String>,
    pub automated_entry: Option<bool>,
    pub date_generated: Option<String>,
    pub truncated_data: Option<bool>,
    // Upstream spelling.
    #[serde(rename = "precent_of_data_within_time_range", default, deserialize_with = "deserialize_opt_i64")]
    pub percent_of_data_within_time_range: Option<i64>,
    pub persisted_response: Option<bool>,
    pub newly_generated: Option<bool>,
}

/// Body of `/getFinancialContributionsOverview/{topic}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinancialContributionsResponse {
    pub topic: String,
    pub normalized_topic_name: String,
    pub committee_id: String,
    pub fec_financial_contributions_summary_text: String,
    #[serde(default)]
    pub committee_name: Option<String>,
    #[serde(default)]
    pub individual_id: Option<FlexibleInt>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub time_range_of_data: Option<String>,
    #[serde(default)]
    pub cycle_end_year: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_i64")]
    pub upvote_count: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_opt_i64")]
    pub downvote_count: Option<i64>,
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(default)]
    pub debug: Option<FinancialDebugInfo>,
    #[serde(default)]
    pub percent_contributions: Option<PercentContributions>,
    #[serde(default)]
    pub contribution_totals: Option<Vec<ContributionTotal>>,
    #[serde(default, rename = "leadership_contributors_to_committee")]
    pub leadership_contributions: Option<Vec<LeadershipContribution>>,
}
