//! The verification task state machine.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use indicators::{Assessment, IndicatorCatalog, ScoreSheet, ScoringEngine, ScoringError};

use crate::checklist::{checklist_items, is_checklist_item};
use crate::types::{
    EvidenceArtifact, Result, TaskDecision, TaskError, TaskKind, TaskStatus, UnmetCondition,
};

/// Effect of a write on the task's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The write moved the task from Assigned to InProgress
    Started,
    /// Status unchanged
    Unchanged,
}

/// One field verification, owned by a single assigned officer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationTask {
    /// Unique task ID
    pub id: String,
    /// Application under verification
    pub application_id: String,
    /// What is being verified
    pub kind: TaskKind,
    /// Officer who owns this task
    pub assigned_officer: String,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Confirmation state of every checklist item of the kind
    pub checklist: BTreeMap<String, bool>,
    /// Date of the field visit
    pub visit_date: Option<NaiveDate>,
    /// Captured evidence references
    pub evidence: Vec<EvidenceArtifact>,
    /// Indicator answers (village tasks only)
    pub score_sheet: Option<ScoreSheet>,
    /// Officer's decision
    pub decision: Option<TaskDecision>,
    /// Officer's remarks
    pub remarks: String,
    /// Score and recommendation frozen at submission
    pub assessment: Option<Assessment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl VerificationTask {
    /// Create a task in the Assigned state.
    pub fn new(
        application_id: impl Into<String>,
        kind: TaskKind,
        assigned_officer: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            application_id: application_id.into(),
            kind,
            assigned_officer: assigned_officer.into(),
            status: TaskStatus::Assigned,
            checklist: checklist_items(kind)
                .iter()
                .map(|item| (item.to_string(), false))
                .collect(),
            visit_date: None,
            evidence: Vec::new(),
            score_sheet: None,
            decision: None,
            remarks: String::new(),
            assessment: None,
            created_at: now,
            updated_at: now,
            submitted_at: None,
        }
    }

    /// Not yet submitted.
    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Submitted
    }

    /// Confirm or clear a checklist item.
    pub fn record_checklist_item(&mut self, item_id: &str, confirmed: bool) -> Result<Progress> {
        self.ensure_open()?;
        if !is_checklist_item(self.kind, item_id) {
            return Err(TaskError::UnknownChecklistItem {
                kind: self.kind,
                item_id: item_id.to_string(),
            });
        }

        self.checklist.insert(item_id.to_string(), confirmed);
        debug!(task_id = %self.id, item_id, confirmed, "Checklist item recorded");
        Ok(self.start())
    }

    /// Attach an evidence reference and record the visit date.
    pub fn record_evidence(
        &mut self,
        artifact: EvidenceArtifact,
        visit_date: NaiveDate,
    ) -> Result<Progress> {
        self.ensure_open()?;
        if artifact.reference.trim().is_empty() {
            return Err(TaskError::EmptyEvidenceReference);
        }

        debug!(task_id = %self.id, reference = %artifact.reference, %visit_date, "Evidence recorded");
        self.evidence.push(artifact);
        self.visit_date = Some(visit_date);
        Ok(self.start())
    }

    /// Answer one indicator. Replaces a previous answer for the same indicator.
    pub fn record_score(
        &mut self,
        catalog: &IndicatorCatalog,
        indicator_id: &str,
        option_index: usize,
    ) -> Result<()> {
        self.ensure_open()?;
        if !self.kind.requires_scoring() {
            return Err(TaskError::ScoringNotApplicable(self.kind));
        }

        self.score_sheet
            .get_or_insert_with(ScoreSheet::new)
            .answer(catalog, indicator_id, option_index)?;
        self.touch();
        Ok(())
    }

    /// Record the officer's decision and remarks.
    ///
    /// This is the only way a decision is set; a computed recommendation is
    /// never copied in.
    pub fn record_decision(&mut self, decision: TaskDecision, remarks: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        if !self.kind.allows(decision) {
            return Err(TaskError::InvalidDecision {
                kind: self.kind,
                decision,
            });
        }

        self.decision = Some(decision);
        self.remarks = remarks.into();
        self.touch();
        Ok(())
    }

    /// Score the sheet with the engine's threshold, without submitting.
    pub fn assess(&self, engine: &ScoringEngine) -> Result<Option<Assessment>> {
        if !self.kind.requires_scoring() {
            return Ok(None);
        }
        match &self.score_sheet {
            Some(sheet) => Ok(Some(engine.assess(sheet)?)),
            None => Ok(None),
        }
    }

    /// Check every submission precondition in order and report the first one unmet.
    pub fn check_submission(
        &self,
        engine: &ScoringEngine,
    ) -> std::result::Result<Option<Assessment>, UnmetCondition> {
        let unconfirmed: Vec<String> = checklist_items(self.kind)
            .iter()
            .filter(|item| !self.checklist.get(**item).copied().unwrap_or(false))
            .map(|item| item.to_string())
            .collect();
        if !unconfirmed.is_empty() {
            return Err(UnmetCondition::ChecklistIncomplete { items: unconfirmed });
        }

        if self.evidence.is_empty() {
            return Err(UnmetCondition::EvidenceMissing);
        }
        if self.visit_date.is_none() {
            return Err(UnmetCondition::VisitDateMissing);
        }

        let assessment = if self.kind.requires_scoring() {
            let sheet = self
                .score_sheet
                .as_ref()
                .ok_or(UnmetCondition::ScoreSheetMissing)?;
            let assessment = engine.assess(sheet).map_err(|e| match e {
                ScoringError::IncompleteScoreSheet { missing } => {
                    UnmetCondition::ScoreSheetIncomplete { missing }
                }
                other => UnmetCondition::ScoreSheetInvalid {
                    reason: other.to_string(),
                },
            })?;
            Some(assessment)
        } else {
            None
        };

        if self.decision.is_none() {
            return Err(UnmetCondition::DecisionMissing);
        }
        if self.remarks.trim().is_empty() {
            return Err(UnmetCondition::RemarksMissing);
        }

        Ok(assessment)
    }

    /// Submit the task. On success it becomes immutable.
    pub fn submit(&mut self, engine: &ScoringEngine) -> Result<TaskDecision> {
        self.ensure_open()?;

        let assessment =
            self.check_submission(engine)
                .map_err(|condition| TaskError::SubmissionRejected {
                    task_id: self.id.clone(),
                    condition,
                })?;
        let decision = self.decision.ok_or_else(|| TaskError::SubmissionRejected {
            task_id: self.id.clone(),
            condition: UnmetCondition::DecisionMissing,
        })?;

        let now = Utc::now();
        self.assessment = assessment;
        self.status = TaskStatus::Submitted;
        self.submitted_at = Some(now);
        self.updated_at = now;

        debug!(task_id = %self.id, kind = %self.kind, %decision, "Task submitted");
        Ok(decision)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(TaskError::AlreadySubmitted {
                task_id: self.id.clone(),
            })
        }
    }

    fn start(&mut self) -> Progress {
        self.touch();
        if self.status == TaskStatus::Assigned {
            self.status = TaskStatus::InProgress;
            Progress::Started
        } else {
            Progress::Unchanged
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
