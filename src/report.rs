//! Plain-text rendering of a canonical record for terminal output.

use std::fmt;

use crate::financial::format_usd;
use crate::models::{FinancialContributionsAnalysis, OrganizationAnalysis};
use crate::store::SavedAnalysisSummary;

/// How many entries of each ranked list are shown.
pub const TOP_ENTRIES: usize = 5;

/// Terminal view of one analysis.
pub struct AnalysisReport<'a>(pub &'a OrganizationAnalysis);

impl fmt::Display for AnalysisReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;
        writeln!(
            f,
            "{} {}: {}",
            analysis.category.icon(),
            analysis.category,
            analysis.topic
        )?;

        if analysis.shows_rating_scale() {
            writeln!(
                f,
                "   Rating: {} ({}/5, {} .. {})",
                analysis.lean_or_label,
                analysis.rating,
                analysis.low_rating_label(),
                analysis.high_rating_label()
            )?;
        } else {
            writeln!(f, "   {}", analysis.lean_or_label)?;
        }

        if !analysis.description.trim().is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", analysis.description.trim())?;
        }

        match analysis.financial_overview {
            Some(ref overview) if analysis.has_financial_data_to_display() => write_overview(f, overview),
            _ if analysis.has_financial_contributions => {
                writeln!(f)?;
                writeln!(f, "   Financial contribution data is available for this topic.")
            }
            _ => Ok(()),
        }
    }
}

fn write_overview(f: &mut fmt::Formatter<'_>, overview: &FinancialContributionsAnalysis) -> fmt::Result {
    writeln!(f)?;
    match (&overview.committee_name, &overview.committee_id) {
        (Some(name), Some(id)) => writeln!(f, "Committee: {} ({})", name, id)?,
        (None, Some(id)) => writeln!(f, "Committee: {}", id)?,
        (Some(name), None) => writeln!(f, "Committee: {}", name)?,
        (None, None) => {}
    }

    if let Some(ref percent) = overview.percent_contributions {
        writeln!(
            f,
            "Democrats:   {} ({:.1}%)",
            format_usd(percent.total_to_democrats as f64),
            percent.percent_to_democrats
        )?;
        writeln!(
            f,
            "Republicans: {} ({:.1}%)",
            format_usd(percent.total_to_republicans as f64),
            percent.percent_to_republicans
        )?;
        writeln!(f, "Total:       {}", format_usd(percent.total_contributions as f64))?;
    }

    let totals = overview.top_contribution_totals(TOP_ENTRIES);
    if !totals.is_empty() {
        writeln!(f)?;
        writeln!(f, "Top recipients:")?;
        for (rank, total) in totals.iter().enumerate() {
            let name = total
                .recipient_name
                .as_deref()
                .or(total.recipient_id.as_deref())
                .unwrap_or("(unnamed)");
            write!(f, "  {}. {} {}", rank + 1, name, format_usd(total.amount()))?;
            if let Some(count) = total.number_of_contributions {
                write!(f, " across {} contributions", count)?;
            }
            writeln!(f)?;
        }
    }

    let leaders = overview.top_leadership_contributions(TOP_ENTRIES);
    if !leaders.is_empty() {
        writeln!(f)?;
        writeln!(f, "Top leadership contributors:")?;
        for (rank, leader) in leaders.iter().enumerate() {
            writeln!(
                f,
                "  {}. {} ({}, {}) {}",
                rank + 1,
                leader.name,
                leader.occupation,
                leader.employer,
                format_usd(leader.amount())
            )?;
        }
    }
    Ok(())
}

/// One line per saved analysis, in the order given.
pub struct HistoryReport<'a>(pub &'a [SavedAnalysisSummary]);

impl fmt::Display for HistoryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No saved analyses.");
        }
        for summary in self.0 {
            writeln!(
                f,
                "{}  {:<24} {:<24} {}",
                summary.date_persisted.format("%Y-%m-%d %H:%M"),
                summary.topic,
                summary.category,
                summary.lean_or_label
            )?;
        }
        Ok(())
    }
}

pub fn render_analysis(analysis: &OrganizationAnalysis) -> String {
    AnalysisReport(analysis).to_string()
}

pub fn render_history(summaries: &[SavedAnalysisSummary]) -> String {
    HistoryReport(summaries).to_string()
}
