use serde::{Deserialize, Serialize};

use crate::category::AnalysisCategory;
use crate::flexible::{deserialize_i64, deserialize_opt_i64};

/// `lean_or_label` of every financial-contributions record.
pub const FINANCIAL_DATA_LABEL: &str = "Financial Data";

/// The canonical result of one analysis, whichever endpoint produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationAnalysis {
    /// The queried organization, possibly corrected by the server.
    pub topic: String,
    /// Free text for political leaning, a scale label for the other scored
    /// categories, `FINANCIAL_DATA_LABEL` for financial contributions.
    pub lean_or_label: String,
    /// Always 0 for financial contributions.
    pub rating: i64,
    pub description: String,
    pub category: AnalysisCategory,
    /// A financial citation exists for this topic, independent of `category`.
    pub has_financial_contributions: bool,
    pub financial_contributions_text: Option<String>,
    pub financial_overview: Option<FinancialContributionsAnalysis>,
}

impl OrganizationAnalysis {
    /// Builds the financial-flavored record. Rating and label are fixed.
    pub fn financial(topic: impl Into<String>, overview: FinancialContributionsAnalysis) -> Self {
        OrganizationAnalysis {
            topic: topic.into(),
            lean_or_label: FINANCIAL_DATA_LABEL.to_string(),
            rating: 0,
            description: overview.summary_text.clone(),
            category: AnalysisCategory::FinancialContributions,
            has_financial_contributions: true,
            financial_contributions_text: Some(overview.summary_text.clone()),
            financial_overview: Some(overview),
        }
    }

    pub fn low_rating_label(&self) -> &'static str {
        self.category.low_rating_label()
    }

    pub fn high_rating_label(&self) -> &'static str {
        self.category.high_rating_label()
    }

    pub fn shows_rating_scale(&self) -> bool {
        self.category.shows_rating_scale()
    }

    pub fn has_financial_data_to_display(&self) -> bool {
        self.category == AnalysisCategory::FinancialContributions && self.financial_overview.is_some()
    }

    /// `category == FinancialContributions` exactly when the record carries the
    /// fixed financial rating and label.
    pub fn is_consistent(&self) -> bool {
        let financial_shape = self.rating == 0 && self.lean_or_label == FINANCIAL_DATA_LABEL;
        (self.category == AnalysisCategory::FinancialContributions) == financial_shape
    }
}

/// Campaign-finance breakdown attached to a financial-contributions record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialContributionsAnalysis {
    pub summary_text: String,
    pub committee_name: Option<String>,
    pub committee_id: Option<String>,
    pub percent_contributions: Option<PercentContributions>,
    /// In response order. Empty means "no data of that kind".
    pub contribution_totals: Vec<ContributionTotal>,
    /// In response order. Empty means "no data of that kind".
    pub leadership_contributions: Vec<LeadershipContribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentContributions {
    #[serde(deserialize_with = "deserialize_i64")]
    pub total_to_democrats: i64,
    #[serde(deserialize_with = "deserialize_i64")]
    pub total_to_republicans: i64,
    pub percent_to_democrats: f64,
    pub percent_to_republicans: f64,
    #[serde(deserialize_with = "deserialize_i64")]
    pub total_contributions: i64,
}

impl PercentContributions {
    /// Non-negative amounts and a total no smaller than either party's share.
    pub fn is_consistent(&self) -> bool {
        self.total_to_democrats >= 0
            && self.total_to_republicans >= 0
            && self.total_contributions >= self.total_to_democrats.max(self.total_to_republicans)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionTotal {
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_i64")]
    pub number_of_contributions: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_opt_i64")]
    pub total_contribution_amount: Option<i64>,
}

impl ContributionTotal {
    /// Ranking key; a missing amount ranks as zero.
    pub fn amount(&self) -> f64 {
        self.total_contribution_amount.unwrap_or(0) as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadershipContribution {
    pub occupation: String,
    pub name: String,
    pub employer: String,
    /// Numeric string, parsed lazily by `amount`.
    pub transaction_amount: String,
}

impl LeadershipContribution {
    /// Ranking key; unparsable or non-finite amounts rank as zero.
    pub fn amount(&self) -> f64 {
        self.transaction_amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overview() -> FinancialContributionsAnalysis {
        FinancialContributionsAnalysis {
            summary_text: "Mostly Republican recipients.".to_string(),
            committee_name: Some("ACME PAC".to_string()),
            committee_id: Some("C00012345".to_string()),
            percent_contributions: None,
            contribution_totals: Vec::new(),
            leadership_contributions: Vec::new(),
        }
    }

    #[test]
    fn financial_records_satisfy_the_category_invariant() {
        let record = OrganizationAnalysis::financial("Acme Corp", overview());
        assert_eq!(record.rating, 0);
        assert_eq!(record.lean_or_label, FINANCIAL_DATA_LABEL);
        assert!(record.has_financial_contributions);
        assert!(record.has_financial_data_to_display());
        assert!(!record.shows_rating_scale());
        assert!(record.is_consistent());
        assert_eq!(record.low_rating_label(), "Democrat");
    }

    #[test]
    fn scored_record_with_financial_shape_is_inconsistent() {
        let mut record = OrganizationAnalysis::financial("Acme Corp", overview());
        record.category = AnalysisCategory::Wokeness;
        assert!(!record.is_consistent());
    }

    #[test]
    fn percent_contributions_invariant() {
        let percent: PercentContributions = serde_json::from_value(json!({
            "total_to_democrats": 100,
            "total_to_republicans": "300",
            "percent_to_democrats": 25.0,
            "percent_to_republicans": 75.0,
            "total_contributions": 400
        }))
        .unwrap();
        assert_eq!(percent.total_to_republicans, 300);
        assert!(percent.is_consistent());

        let broken = PercentContributions {
            total_contributions: 200,
            ..percent
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn contribution_total_fields_are_all_optional() {
        let total: ContributionTotal = serde_json::from_value(json!({})).unwrap();
        assert_eq!(total.recipient_name, None);
        assert_eq!(total.amount(), 0.0);

        let total: ContributionTotal = serde_json::from_value(json!({
            "recipient_name": "SMITH FOR SENATE",
            "total_contribution_amount": "2500",
            "number_of_contributions": null
        }))
        .unwrap();
        assert_eq!(total.total_contribution_amount, Some(2500));
        assert_eq!(total.number_of_contributions, None);
    }

    #[test]
    fn leadership_amount_parses_lazily() {
        let mut contribution = LeadershipContribution {
            occupation: "CEO".to_string(),
            name: "DOE, JANE".to_string(),
            employer: "ACME".to_string(),
            transaction_amount: "1500.50".to_string(),
        };
        assert_eq!(contribution.amount(), 1500.5);
        contribution.transaction_amount = "about a grand".to_string();
        assert_eq!(contribution.amount(), 0.0);
        contribution.transaction_amount = "NaN".to_string();
        assert_eq!(contribution.amount(), 0.0);
    }
}
