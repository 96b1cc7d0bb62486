//! The persisted graph shape and its mapping to and from the canonical record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::AnalysisCategory;
use crate::models::{
    ContributionTotal, FinancialContributionsAnalysis, LeadershipContribution, OrganizationAnalysis,
    PercentContributions,
};
use crate::store::SavedAnalysisSummary;

/// One saved topic. Owns its financial overview, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub id: Uuid,
    /// Insertion order, used to break ties on `date_persisted`.
    pub sequence: i64,
    pub topic: String,
    pub lean: String,
    pub rating: i64,
    pub context: String,
    /// Display name of the category; unknown names load as `Undefined`.
    pub category: String,
    pub created_with_financial_contributions_info: bool,
    pub financial_contributions_text: Option<String>,
    pub date_persisted: DateTime<Utc>,
    pub overview: Option<StoredOverview>,
}

/// Financial sub-graph, owned 1:1 by a `StoredAnalysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOverview {
    pub id: Uuid,
    pub summary_text: String,
    pub committee_name: Option<String>,
    pub committee_id: Option<String>,
    pub percent_contributions: Option<PercentContributions>,
    pub contribution_totals: Vec<StoredContributionTotal>,
    pub leadership_contributions: Vec<StoredLeadershipContribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContributionTotal {
    pub position: i32,
    pub recipient_id: Option<String>,
    pub recipient_name: Option<String>,
    pub number_of_contributions: Option<i64>,
    pub total_contribution_amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLeadershipContribution {
    pub position: i32,
    pub occupation: String,
    pub name: String,
    pub employer: String,
    pub transaction_amount: String,
}

impl StoredAnalysis {
    /// Builds a fresh graph for `analysis`, saved under `topic`.
    pub fn from_analysis(topic: &str, analysis: &OrganizationAnalysis, sequence: i64, now: DateTime<Utc>) -> Self {
        StoredAnalysis {
            id: Uuid::new_v4(),
            sequence,
            topic: topic.to_string(),
            lean: analysis.lean_or_label.clone(),
            rating: analysis.rating,
            context: analysis.description.clone(),
            category: analysis.category.display_name().to_string(),
            created_with_financial_contributions_info: analysis.has_financial_contributions,
            financial_contributions_text: analysis.financial_contributions_text.clone(),
            date_persisted: now,
            overview: analysis.financial_overview.as_ref().map(StoredOverview::from_analysis),
        }
    }

    /// Rebuilds the canonical record. Child lists come back in saved order.
    pub fn into_analysis(self) -> OrganizationAnalysis {
        OrganizationAnalysis {
            topic: self.topic,
            lean_or_label: self.lean,
            rating: self.rating,
            description: self.context,
            category: AnalysisCategory::from_stored(&self.category),
            has_financial_contributions: self.created_with_financial_contributions_info,
            financial_contributions_text: self.financial_contributions_text,
            financial_overview: self.overview.map(StoredOverview::into_analysis),
        }
    }

    pub fn summary(&self) -> SavedAnalysisSummary {
        SavedAnalysisSummary {
            id: self.id,
            topic: self.topic.clone(),
            category: AnalysisCategory::from_stored(&self.category),
            lean_or_label: self.lean.clone(),
            rating: self.rating,
            date_persisted: self.date_persisted,
        }
    }
}

impl StoredOverview {
    pub fn from_analysis(overview: &FinancialContributionsAnalysis) -> Self {
        StoredOverview {
            id: Uuid::new_v4(),
            summary_text: overview.summary_text.clone(),
            committee_name: overview.committee_name.clone(),
            committee_id: overview.committee_id.clone(),
            percent_contributions: overview.percent_contributions.clone(),
            contribution_totals: overview
                .contribution_totals
                .iter()
                .enumerate()
                .map(|(position, total)| StoredContributionTotal {
                    position: position as i32,
                    recipient_id: total.recipient_id.clone(),
                    recipient_name: total.recipient_name.clone(),
                    number_of_contributions: total.number_of_contributions,
                    total_contribution_amount: total.total_contribution_amount,
                })
                .collect(),
            leadership_contributions: overview
                .leadership_contributions
                .iter()
                .enumerate()
                .map(|(position, c)| StoredLeadershipContribution {
                    position: position as i32,
                    occupation: c.occupation.clone(),
                    name: c.name.clone(),
                    employer: c.employer.clone(),
                    transaction_amount: c.transaction_amount.clone(),
                })
                .collect(),
        }
    }

    pub fn into_analysis(mut self) -> FinancialContributionsAnalysis {
        self.contribution_totals.sort_by_key(|t| t.position);
        self.leadership_contributions.sort_by_key(|c| c.position);

        FinancialContributionsAnalysis {
            summary_text: self.summary_text,
            committee_name: self.committee_name,
            committee_id: self.committee_id,
            percent_contributions: self.percent_contributions,
            contribution_totals: self
                .contribution_totals
                .into_iter()
                .map(|t| ContributionTotal {
                    recipient_id: t.recipient_id,
                    recipient_name: t.recipient_name,
                    number_of_contributions: t.number_of_contributions,
                    total_contribution_amount: t.total_contribution_amount,
                })
                .collect(),
            leadership_contributions: self
                .leadership_contributions
                .into_iter()
                .map(|c| LeadershipContribution {
                    occupation: c.occupation,
                    name: c.name,
                    employer: c.employer,
                    transaction_amount: c.transaction_amount,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn financial_analysis() -> OrganizationAnalysis {
        OrganizationAnalysis::financial(
            "Acme Corp",
            FinancialContributionsAnalysis {
                summary_text: "Summary".to_string(),
                committee_name: None,
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
                        recipient_id: Some("R2".to_string()),
                        recipient_name: None,
                        number_of_contributions: Some(2),
                        total_contribution_amount: Some(10),
                    },
                    ContributionTotal {
                        recipient_id: Some("R1".to_string()),
                        recipient_name: None,
                        number_of_contributions: None,
                        total_contribution_amount: Some(90),
                    },
                ],
                leadership_contributions: vec![LeadershipContribution {
                    occupation: "CEO".to_string(),
                    name: "DOE, JANE".to_string(),
                    employer: "ACME".to_string(),
                    transaction_amount: "5000".to_string(),
                }],
            },
        )
    }

    #[test]
    fn graph_round_trips_to_the_same_record() {
        let analysis = financial_analysis();
        let stored = StoredAnalysis::from_analysis("Acme Corp", &analysis, 1, Utc::now());
        assert_eq!(stored.category, "Financial Contributions");
        assert_eq!(stored.into_analysis(), analysis);
    }

    #[test]
    fn child_lists_are_rebuilt_by_position() {
        let analysis = financial_analysis();
        let mut stored = StoredAnalysis::from_analysis("Acme Corp", &analysis, 1, Utc::now());
        if let Some(ref mut overview) = stored.overview {
            overview.contribution_totals.reverse();
        }
        let rebuilt = stored.into_analysis();
        let ids: Vec<_> = rebuilt
            .financial_overview
            .unwrap()
            .contribution_totals
            .into_iter()
            .map(|t| t.recipient_id.unwrap())
            .collect();
        assert_eq!(ids, vec!["R2", "R1"]);
    }

    #[test]
    fn unknown_category_rehydrates_as_undefined() {
        let mut stored = StoredAnalysis::from_analysis("Acme Corp", &financial_analysis(), 1, Utc::now());
        stored.category = "Epstein Connections".to_string();
        assert_eq!(stored.summary().category, AnalysisCategory::Undefined);
        assert_eq!(stored.into_analysis().category, AnalysisCategory::Undefined);
    }
}
