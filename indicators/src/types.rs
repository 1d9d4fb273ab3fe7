//! Core types for the indicator catalog.
//!
//! Indicators are grouped into domains. Every indicator offers a fixed,
//! ordered set of answers, each worth a small number of deficiency points.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs so field forms render the same option lists the engine scores.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// One permitted answer to an indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct IndicatorOption {
    /// Label shown to the field officer
    pub label: String,
    /// Deficiency points awarded when this option is chosen
    pub points: u32,
}

impl IndicatorOption {
    pub fn new(label: impl Into<String>, points: u32) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }
}

/// A single scoring question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Indicator {
    /// Unique identifier
    pub id: String,
    /// Domain this indicator belongs to
    pub domain_id: String,
    /// Question put to the field officer
    pub prompt: String,
    /// Permitted answers, in display order
    pub options: Vec<IndicatorOption>,
}

impl Indicator {
    /// Yes/no question where a missing facility is the deficient answer.
    pub fn availability(
        id: impl Into<String>,
        domain_id: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            domain_id: domain_id.into(),
            prompt: prompt.into(),
            options: vec![
                IndicatorOption::new("Yes", 0),
                IndicatorOption::new("No", 2),
            ],
        }
    }

    /// Banded-percentage question where low coverage is the deficient answer.
    pub fn coverage(
        id: impl Into<String>,
        domain_id: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            domain_id: domain_id.into(),
            prompt: prompt.into(),
            options: vec![
                IndicatorOption::new("Above 75%", 0),
                IndicatorOption::new("50% to 75%", 1),
                IndicatorOption::new("Below 50%", 2),
            ],
        }
    }

    /// Highest attainable points for this indicator.
    pub fn max_points(&self) -> u32 {
        self.options.iter().map(|o| o.points).max().unwrap_or(0)
    }

    /// Look up an option by index.
    pub fn option(&self, index: usize) -> Option<&IndicatorOption> {
        self.options.get(index)
    }
}

/// A scoring category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Domain {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Indicator ids in display order
    pub indicator_ids: Vec<String>,
    /// Sum of each indicator's highest option
    pub max_points: u32,
}

/// Advisory outcome derived from a deficiency total.
///
/// A lower total means fewer deficiencies were found, and a village under the
/// threshold qualifies for assistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Eligible,
    NotEligible,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eligible => "eligible",
            Self::NotEligible => "not_eligible",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_options() {
        let indicator = Indicator::availability("water-tap", "water", "Piped water?");
        assert_eq!(indicator.options.len(), 2);
        assert_eq!(indicator.max_points(), 2);
        assert_eq!(indicator.option(0).map(|o| o.points), Some(0));
        assert!(indicator.option(2).is_none());
    }

    #[test]
    fn test_coverage_options() {
        let indicator = Indicator::coverage("immunisation", "health", "Children immunised");
        assert_eq!(indicator.options.len(), 3);
        assert_eq!(indicator.option(1).map(|o| o.points), Some(1));
        assert_eq!(indicator.max_points(), 2);
    }

    #[test]
    fn test_recommendation_name_matches_serialized_form() {
        for recommendation in [Recommendation::Eligible, Recommendation::NotEligible] {
            let json = serde_json::to_value(recommendation).unwrap();
            assert_eq!(json, recommendation.as_str());
        }
    }
}
