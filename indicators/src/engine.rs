//! Deficiency scoring engine.
//!
//! Converts a completed score sheet into per-domain and total deficiency
//! points. Higher totals mean worse conditions on the ground; a village whose
//! total falls strictly below the eligibility threshold qualifies.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::IndicatorCatalog;
use crate::types::Recommendation;

/// Threshold used when none is configured.
pub const DEFAULT_ELIGIBILITY_THRESHOLD: u32 = 70;

/// Error types for scoring operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    /// One or more catalog indicators have no answer
    #[error("Score sheet incomplete, missing indicators: {}", missing.join(", "))]
    IncompleteScoreSheet { missing: Vec<String> },

    /// Answer names an indicator the catalog does not define
    #[error("Unknown indicator: {0}")]
    UnknownIndicator(String),

    /// Answer is not one of the indicator's options
    #[error("Option {option_index} is not defined for indicator {indicator_id} ({available} options)")]
    InvalidOption {
        indicator_id: String,
        option_index: usize,
        available: usize,
    },
}

/// Chosen option per indicator for one verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSheet {
    answers: BTreeMap<String, usize>,
}

impl ScoreSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer after checking it against the catalog.
    ///
    /// Re-answering an indicator replaces the previous choice.
    pub fn answer(
        &mut self,
        catalog: &IndicatorCatalog,
        indicator_id: &str,
        option_index: usize,
    ) -> Result<(), ScoringError> {
        validate_answer(catalog, indicator_id, option_index)?;
        self.answers.insert(indicator_id.to_string(), option_index);
        Ok(())
    }

    /// Record an answer without validation.
    pub fn insert(&mut self, indicator_id: impl Into<String>, option_index: usize) {
        self.answers.insert(indicator_id.into(), option_index);
    }

    pub fn get(&self, indicator_id: &str) -> Option<usize> {
        self.answers.get(indicator_id).copied()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, usize)> for ScoreSheet {
    fn from_iter<T: IntoIterator<Item = (String, usize)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

/// Result of scoring a complete sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Points per domain id
    pub domain_scores: BTreeMap<String, u32>,
    /// Sum of all domain scores
    pub total: u32,
    /// `total / max_total`
    pub deficiency_ratio: f64,
    /// Catalog revision the sheet was scored against
    pub catalog_fingerprint: String,
}

/// Score plus the advisory recommendation derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub report: ScoreReport,
    pub threshold: u32,
    pub recommendation: Recommendation,
}

/// Scores sheets against a shared catalog.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    catalog: Arc<IndicatorCatalog>,
    threshold: u32,
}

impl ScoringEngine {
    /// Create an engine with the default eligibility threshold.
    pub fn new(catalog: Arc<IndicatorCatalog>) -> Self {
        Self::with_threshold(catalog, DEFAULT_ELIGIBILITY_THRESHOLD)
    }

    pub fn with_threshold(catalog: Arc<IndicatorCatalog>, threshold: u32) -> Self {
        Self { catalog, threshold }
    }

    pub fn catalog(&self) -> &Arc<IndicatorCatalog> {
        &self.catalog
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Validate a sheet without scoring it.
    pub fn validate(&self, sheet: &ScoreSheet) -> Result<(), ScoringError> {
        let missing: Vec<String> = self
            .catalog
            .indicators()
            .iter()
            .filter(|i| sheet.get(&i.id).is_none())
            .map(|i| i.id.clone())
            .collect();

        if !missing.is_empty() {
            return Err(ScoringError::IncompleteScoreSheet { missing });
        }

        for (indicator_id, option_index) in sheet.iter() {
            validate_answer(&self.catalog, indicator_id, option_index)?;
        }

        Ok(())
    }

    /// Compute domain scores, total and deficiency ratio.
    ///
    /// Fails without a partial total unless every indicator has exactly one
    /// valid answer.
    pub fn compute_score(&self, sheet: &ScoreSheet) -> Result<ScoreReport, ScoringError> {
        self.validate(sheet)?;

        let mut domain_scores: BTreeMap<String, u32> = self
            .catalog
            .list_domains()
            .iter()
            .map(|d| (d.id.clone(), 0))
            .collect();
        let mut total = 0;

        for indicator in self.catalog.indicators() {
            let points = sheet
                .get(&indicator.id)
                .and_then(|index| indicator.option(index))
                .map(|o| o.points)
                .unwrap_or(0);

            *domain_scores.entry(indicator.domain_id.clone()).or_default() += points;
            total += points;
        }

        let deficiency_ratio = if self.catalog.max_total() == 0 {
            0.0
        } else {
            f64::from(total) / f64::from(self.catalog.max_total())
        };

        Ok(ScoreReport {
            domain_scores,
            total,
            deficiency_ratio,
            catalog_fingerprint: self.catalog.fingerprint().to_string(),
        })
    }

    /// Score a sheet and derive the recommendation at the configured threshold.
    pub fn assess(&self, sheet: &ScoreSheet) -> Result<Assessment, ScoringError> {
        let report = self.compute_score(sheet)?;
        let recommendation = Self::recommend(report.total, self.threshold);

        tracing::debug!(
            total = report.total,
            threshold = self.threshold,
            recommendation = %recommendation.as_str(),
            "Score sheet assessed"
        );

        Ok(Assessment {
            report,
            threshold: self.threshold,
            recommendation,
        })
    }

    /// `total < threshold` is eligible; the boundary itself is not.
    pub fn recommend(total: u32, threshold: u32) -> Recommendation {
        if total < threshold {
            Recommendation::Eligible
        } else {
            Recommendation::NotEligible
        }
    }
}

fn validate_answer(
    catalog: &IndicatorCatalog,
    indicator_id: &str,
    option_index: usize,
) -> Result<(), ScoringError> {
    let indicator = catalog
        .indicator(indicator_id)
        .map_err(|_| ScoringError::UnknownIndicator(indicator_id.to_string()))?;
    if indicator.option(option_index).is_none() {
        return Err(ScoringError::InvalidOption {
            indicator_id: indicator_id.to_string(),
            option_index,
            available: indicator.options.len(),
        });
    }
    Ok(())
}

/// Build a complete sheet whose total equals `target` on the standard option
/// layout, filling indicators in catalog order with their highest options.
#[cfg(test)]
pub(crate) fn sheet_with_total(catalog: &IndicatorCatalog, target: u32) -> ScoreSheet {
    let mut remaining = target;
    let mut sheet = ScoreSheet::new();

    for indicator in catalog.indicators() {
        let (index, points) = indicator
            .options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.points <= remaining)
            .max_by_key(|(_, o)| o.points)
            .map(|(i, o)| (i, o.points))
            .unwrap_or((0, 0));
        remaining -= points;
        sheet.insert(indicator.id.clone(), index);
    }

    sheet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(Arc::new(IndicatorCatalog::standard().unwrap()))
    }

    #[test]
    fn test_recommend_boundary() {
        assert_eq!(ScoringEngine::recommend(68, 70), Recommendation::Eligible);
        assert_eq!(ScoringEngine::recommend(69, 70), Recommendation::Eligible);
        assert_eq!(ScoringEngine::recommend(70, 70), Recommendation::NotEligible);
        assert_eq!(ScoringEngine::recommend(74, 70), Recommendation::NotEligible);
    }

    #[test]
    fn test_all_best_answers_scores_zero() {
        let engine = engine();
        let sheet = sheet_with_total(engine.catalog(), 0);

        let report = engine.compute_score(&sheet).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.deficiency_ratio, 0.0);
        assert!(report.domain_scores.values().all(|s| *s == 0));
    }

    #[test]
    fn test_all_worst_answers_scores_max() {
        let engine = engine();
        let sheet = sheet_with_total(engine.catalog(), 100);

        let report = engine.compute_score(&sheet).unwrap();
        assert_eq!(report.total, 100);
        assert_eq!(report.deficiency_ratio, 1.0);
    }

    #[test]
    fn test_domain_scores_bounded_and_sum_to_total() {
        let engine = engine();

        for target in [0, 1, 17, 50, 62, 74, 97, 100] {
            let sheet = sheet_with_total(engine.catalog(), target);
            let report = engine.compute_score(&sheet).unwrap();

            assert_eq!(report.total, target);
            assert_eq!(report.domain_scores.values().sum::<u32>(), report.total);
            for domain in engine.catalog().list_domains() {
                assert!(report.domain_scores[&domain.id] <= domain.max_points);
            }
        }
    }

    #[test]
    fn test_incomplete_sheet_names_missing() {
        let engine = engine();
        let mut sheet = ScoreSheet::new();
        sheet.insert("ws-piped-water", 0);

        match engine.compute_score(&sheet) {
            Err(ScoringError::IncompleteScoreSheet { missing }) => {
                assert_eq!(missing.len(), 49);
                assert!(!missing.contains(&"ws-piped-water".to_string()));
                assert!(missing.contains(&"lv-livestock-services".to_string()));
            }
            other => panic!("expected incomplete sheet, got {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_wins_over_invalid_option() {
        let engine = engine();
        let mut sheet = ScoreSheet::new();
        sheet.insert("ws-piped-water", 9);

        assert!(matches!(
            engine.compute_score(&sheet),
            Err(ScoringError::IncompleteScoreSheet { .. })
        ));
    }

    #[test]
    fn test_invalid_option_in_complete_sheet() {
        let engine = engine();
        let mut sheet = sheet_with_total(engine.catalog(), 10);
        sheet.insert("ws-odf-plus", 2);

        assert_eq!(
            engine.compute_score(&sheet).unwrap_err(),
            ScoringError::InvalidOption {
                indicator_id: "ws-odf-plus".to_string(),
                option_index: 2,
                available: 2,
            }
        );
    }

    #[test]
    fn test_unknown_indicator_in_sheet() {
        let engine = engine();
        let mut sheet = sheet_with_total(engine.catalog(), 10);
        sheet.insert("zz-moon-base", 0);

        assert_eq!(
            engine.compute_score(&sheet).unwrap_err(),
            ScoringError::UnknownIndicator("zz-moon-base".to_string())
        );
    }

    #[test]
    fn test_answer_validates_at_record_time() {
        let engine = engine();
        let mut sheet = ScoreSheet::new();

        assert!(sheet.answer(engine.catalog(), "ed-enrolment", 2).is_ok());
        assert!(matches!(
            sheet.answer(engine.catalog(), "ed-enrolment", 3),
            Err(ScoringError::InvalidOption { .. })
        ));
        assert_eq!(sheet.get("ed-enrolment"), Some(2));
    }

    #[test]
    fn test_assess_uses_configured_threshold() {
        let catalog = Arc::new(IndicatorCatalog::standard().unwrap());
        let engine = ScoringEngine::with_threshold(catalog.clone(), 60);
        let sheet = sheet_with_total(&catalog, 62);

        let assessment = engine.assess(&sheet).unwrap();
        assert_eq!(assessment.report.total, 62);
        assert_eq!(assessment.recommendation, Recommendation::NotEligible);

        let assessment = ScoringEngine::new(catalog).assess(&sheet).unwrap();
        assert_eq!(assessment.recommendation, Recommendation::Eligible);
    }
}
