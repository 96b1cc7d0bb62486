//! Financial-contributions specialization of the analysis client, plus the
//! ranking comparator consumers use to present top-N lists.

use log::{debug, info};
use std::cmp::Ordering;

use crate::category::AnalysisCategory;
use crate::client::AnalysisClient;
use crate::error::FetchError;
use crate::models::{ContributionTotal, FinancialContributionsAnalysis, LeadershipContribution};
use crate::wire::FinancialContributionsResponse;

impl AnalysisClient {
    /// Fetches the campaign-finance overview for `topic`.
    ///
    /// Missing lists are not errors: they come back empty. List order is the
    /// order the service delivered; use the `ranked_*` helpers for a canonical
    /// ranking.
    pub async fn fetch_financial(&self, topic: &str) -> Result<FinancialContributionsAnalysis, FetchError> {
        let body = self
            .get_json(AnalysisCategory::FinancialContributions, topic)
            .await?;
        let response: FinancialContributionsResponse =
            serde_json::from_value(body).map_err(crate::error::DecodeError::from)?;
        let overview = normalize_financial(response);
        info!(
            "Financial overview for '{}': {} recipient totals, {} leadership contributions",
            topic,
            overview.contribution_totals.len(),
            overview.leadership_contributions.len()
        );
        Ok(overview)
    }
}

/// Folds the financial wire shape into the canonical sub-record.
pub fn normalize_financial(response: FinancialContributionsResponse) -> FinancialContributionsAnalysis {
    if let Some(ref percent) = response.percent_contributions {
        if !percent.is_consistent() {
            debug!(
                "Percent split for '{}' has total {} below a party share ({} / {})",
                response.topic,
                percent.total_contributions,
                percent.total_to_democrats,
                percent.total_to_republicans
            );
        }
    }

    FinancialContributionsAnalysis {
        summary_text: response.fec_financial_contributions_summary_text,
        committee_name: response.committee_name,
        committee_id: Some(response.committee_id),
        percent_contributions: response.percent_contributions,
        contribution_totals: response.contribution_totals.unwrap_or_default(),
        leadership_contributions: response.leadership_contributions.unwrap_or_default(),
    }
}

/// Descending by amount. Used with a stable sort so ties keep response order.
pub fn by_amount_descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn ranked_contribution_totals(totals: &[ContributionTotal]) -> Vec<&ContributionTotal> {
    let mut ranked: Vec<&ContributionTotal> = totals.iter().collect();
    ranked.sort_by(|a, b| by_amount_descending(a.amount(), b.amount()));
    ranked
}

pub fn ranked_leadership_contributions(contributions: &[LeadershipContribution]) -> Vec<&LeadershipContribution> {
    let mut ranked: Vec<&LeadershipContribution> = contributions.iter().collect();
    ranked.sort_by(|a, b| by_amount_descending(a.amount(), b.amount()));
    ranked
}

impl FinancialContributionsAnalysis {
    pub fn top_contribution_totals(&self, n: usize) -> Vec<&ContributionTotal> {
        let mut ranked = ranked_contribution_totals(&self.contribution_totals);
        ranked.truncate(n);
        ranked
    }

    pub fn top_leadership_contributions(&self, n: usize) -> Vec<&LeadershipContribution> {
        let mut ranked = ranked_leadership_contributions(&self.leadership_contributions);
        ranked.truncate(n);
        ranked
    }
}

/// Whole-dollar currency text, e.g. `$1,234` or `-$50`.
pub fn format_usd(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}", sign, grouped)
}
