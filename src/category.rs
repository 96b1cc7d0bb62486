use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Label returned by every scalar scale for a rating outside 1..=5.
pub const UNKNOWN_RATING_LABEL: &str = "Unknown";

/// Fixed label for the financial category, which has no numeric scale.
pub const SEE_DETAILS_LABEL: &str = "See Details";

/// The closed set of analysis kinds the remote service can answer.
///
/// `Undefined` is a sentinel: it has no endpoint, no prompt and no scale, and
/// it is what any unrecognized persisted category string decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisCategory {
    PoliticalLeaning,
    DeiFriendliness,
    Wokeness,
    EnvironmentalImpact,
    ImmigrationSupport,
    TechnologyInnovation,
    FinancialContributions,
    Undefined,
}

impl AnalysisCategory {
    /// Every category a caller may dispatch, in menu order.
    pub const SELECTABLE: [AnalysisCategory; 7] = [
        AnalysisCategory::PoliticalLeaning,
        AnalysisCategory::DeiFriendliness,
        AnalysisCategory::Wokeness,
        AnalysisCategory::EnvironmentalImpact,
        AnalysisCategory::ImmigrationSupport,
        AnalysisCategory::TechnologyInnovation,
        AnalysisCategory::FinancialContributions,
    ];

    /// Stable name used for display and as the persisted representation.
    pub fn display_name(&self) -> &'static str {
        match self {
            AnalysisCategory::PoliticalLeaning => "Political Leaning",
            AnalysisCategory::DeiFriendliness => "DEI Friendliness",
            AnalysisCategory::Wokeness => "Wokeness",
            AnalysisCategory::EnvironmentalImpact => "Environmental Impact",
            AnalysisCategory::ImmigrationSupport => "Immigration Support",
            AnalysisCategory::TechnologyInnovation => "Technology Innovation",
            AnalysisCategory::FinancialContributions => "Financial Contributions",
            AnalysisCategory::Undefined => "Undefined",
        }
    }

    /// Recovers a category from its persisted string. Never fails: unknown or
    /// corrupt values become `Undefined`.
    pub fn from_stored(value: &str) -> Self {
        Self::SELECTABLE
            .iter()
            .copied()
            .find(|category| category.display_name() == value)
            .unwrap_or(AnalysisCategory::Undefined)
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            AnalysisCategory::PoliticalLeaning => {
                "What organization do you want to find the political leaning of?"
            }
            AnalysisCategory::DeiFriendliness => {
                "What organization do you want to evaluate for DEI friendliness?"
            }
            AnalysisCategory::Wokeness => "What organization do you want to assess for wokeness?",
            AnalysisCategory::EnvironmentalImpact => {
                "What organization do you want to analyze for environmental impact?"
            }
            AnalysisCategory::ImmigrationSupport => {
                "What organization do you want to evaluate for immigration support?"
            }
            AnalysisCategory::TechnologyInnovation => {
                "What organization do you want to assess for technology innovation?"
            }
            AnalysisCategory::FinancialContributions => {
                "What organization do you want to review financial contributions for?"
            }
            AnalysisCategory::Undefined => "",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AnalysisCategory::PoliticalLeaning => "building.columns",
            AnalysisCategory::DeiFriendliness => "person.3",
            AnalysisCategory::Wokeness => "eye",
            AnalysisCategory::EnvironmentalImpact => "leaf",
            AnalysisCategory::ImmigrationSupport => "globe.americas",
            AnalysisCategory::TechnologyInnovation => "lightbulb",
            AnalysisCategory::FinancialContributions => "dollarsign.circle",
            AnalysisCategory::Undefined => "",
        }
    }

    /// Path prefix on the analysis service. Empty for `Undefined`, which must
    /// never be dispatched.
    pub fn endpoint(&self) -> &'static str {
        match self {
            AnalysisCategory::PoliticalLeaning => "/getPoliticalLeaning",
            AnalysisCategory::DeiFriendliness => "/getDEIFriendlinessScore",
            AnalysisCategory::Wokeness => "/getWokenessScore",
            AnalysisCategory::EnvironmentalImpact => "/getEnvironmentalImpactScore",
            AnalysisCategory::ImmigrationSupport => "/getImmigrationSupportScore",
            AnalysisCategory::TechnologyInnovation => "/getTechnologyInnovationScore",
            AnalysisCategory::FinancialContributions => "/getFinancialContributionsOverview",
            AnalysisCategory::Undefined => "",
        }
    }

    /// Maps a 1..=5 rating onto this category's descriptive scale.
    pub fn rating_label(&self, rating: i64) -> String {
        let scale: [&str; 5] = match self {
            AnalysisCategory::PoliticalLeaning => [
                "Very Liberal",
                "Liberal",
                "Moderate",
                "Conservative",
                "Very Conservative",
            ],
            AnalysisCategory::DeiFriendliness => [
                "Not DEI Friendly",
                "Slightly DEI Friendly",
                "Moderately DEI Friendly",
                "DEI Friendly",
                "Very DEI Friendly",
            ],
            AnalysisCategory::Wokeness => [
                "Not Woke",
                "Slightly Woke",
                "Moderately Woke",
                "Woke",
                "Very Woke",
            ],
            AnalysisCategory::EnvironmentalImpact => [
                "Poor Environmental Record",
                "Below Average",
                "Average",
                "Good Environmental Record",
                "Excellent Environmental Record",
            ],
            AnalysisCategory::ImmigrationSupport => [
                "Anti-Immigration",
                "Immigration Skeptic",
                "Moderate on Immigration",
                "Pro-Immigration",
                "Strongly Pro-Immigration",
            ],
            AnalysisCategory::TechnologyInnovation => [
                "Not Innovative",
                "Slightly Innovative",
                "Moderately Innovative",
                "Innovative",
                "Highly Innovative",
            ],
            AnalysisCategory::FinancialContributions => return SEE_DETAILS_LABEL.to_string(),
            AnalysisCategory::Undefined => return String::new(),
        };

        match rating {
            1..=5 => scale[(rating - 1) as usize].to_string(),
            _ => UNKNOWN_RATING_LABEL.to_string(),
        }
    }

    /// Label for the low end of the rating scale.
    pub fn low_rating_label(&self) -> &'static str {
        match self {
            AnalysisCategory::PoliticalLeaning => "Liberal",
            AnalysisCategory::DeiFriendliness => "Not DEI Friendly",
            AnalysisCategory::Wokeness => "Not Woke",
            AnalysisCategory::EnvironmentalImpact => "Poor",
            AnalysisCategory::ImmigrationSupport => "Anti-Immigration",
            AnalysisCategory::TechnologyInnovation => "Not Innovative",
            AnalysisCategory::FinancialContributions => "Democrat",
            AnalysisCategory::Undefined => "",
        }
    }

    /// Label for the high end of the rating scale.
    pub fn high_rating_label(&self) -> &'static str {
        match self {
            AnalysisCategory::PoliticalLeaning => "Conservative",
            AnalysisCategory::DeiFriendliness => "Very DEI Friendly",
            AnalysisCategory::Wokeness => "Very Woke",
            AnalysisCategory::EnvironmentalImpact => "Excellent",
            AnalysisCategory::ImmigrationSupport => "Pro-Immigration",
            AnalysisCategory::TechnologyInnovation => "Highly Innovative",
            AnalysisCategory::FinancialContributions => "Republican",
            AnalysisCategory::Undefined => "",
        }
    }

    /// Whether results in this category are presented on the 1..=5 scale.
    pub fn shows_rating_scale(&self) -> bool {
        !matches!(self, AnalysisCategory::FinancialContributions)
    }
}

impl fmt::Display for AnalysisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_name())
    }
}

impl Serialize for AnalysisCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

// Unknown names and nulls decode as `Undefined`.
impl<'de> Deserialize<'de> for AnalysisCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(AnalysisCategory::from_stored)
            .unwrap_or(AnalysisCategory::Undefined))
    }
}
