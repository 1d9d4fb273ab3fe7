//! The shipped scenarios replay exactly as their expectations say.

use indicators::{IndicatorCatalog, Recommendation, ScoreSheet, ScoringEngine};
use pipeline::replay::{self, Script};
use pipeline::{ApplicationStatus, LifecycleEvent, PipelineConfig};
use std::sync::Arc;

#[tokio::test]
async fn test_two_villages_scenario() {
    let script = Script::from_yaml(include_str!("../scenarios/two_villages.yaml")).unwrap();
    let report = replay::run(script, PipelineConfig::default()).await.unwrap();

    assert!(report.unexpected().is_empty(), "{:#?}", report.unexpected());

    let rampur = &report.applications["rampur"];
    assert_eq!(rampur.status, ApplicationStatus::FullyFunded);
    assert_eq!(rampur.released_amount(), 50_00_000);

    let khedi = &report.applications["khedi"];
    assert_eq!(khedi.status, ApplicationStatus::Rejected);

    let khedi_task = &report.tasks["khedi-village"];
    let assessment = khedi_task.assessment.as_ref().unwrap();
    assert_eq!(assessment.report.total, 74);
    assert_eq!(assessment.recommendation, Recommendation::NotEligible);

    let installments = report
        .events
        .iter()
        .filter(|event| matches!(event, LifecycleEvent::InstallmentReleased { .. }))
        .count();
    assert_eq!(installments, 3);
}

#[test]
fn test_sample_sheet_scores_62() {
    let sheet: ScoreSheet =
        serde_yaml::from_str(include_str!("../scenarios/sheet_62.yaml")).unwrap();
    let engine = ScoringEngine::new(Arc::new(IndicatorCatalog::standard().unwrap()));
    let assessment = engine.assess(&sheet).unwrap();
    assert_eq!(assessment.report.total, 62);
    assert_eq!(assessment.recommendation, Recommendation::Eligible);
}
