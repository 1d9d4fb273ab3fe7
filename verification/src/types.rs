//! Core types for verification tasks.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use indicators::ScoringError;

/// What is being verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Village eligibility, scored against the indicator catalog
    Village,
    /// Village development committee
    Committee,
    /// Executing agency
    Agency,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Village => "village",
            Self::Committee => "committee",
            Self::Agency => "agency",
        }
    }

    /// Only village verification is scored.
    pub fn requires_scoring(&self) -> bool {
        matches!(self, Self::Village)
    }

    /// Decisions an officer may record for this kind.
    pub fn allowed_decisions(&self) -> &'static [TaskDecision] {
        match self {
            Self::Village => &[TaskDecision::Eligible, TaskDecision::NotEligible],
            Self::Committee | Self::Agency => &[TaskDecision::Verified, TaskDecision::NotVerified],
        }
    }

    pub fn allows(&self, decision: TaskDecision) -> bool {
        self.allowed_decisions().contains(&decision)
    }

    pub fn all() -> [Self; 3] {
        [Self::Village, Self::Committee, Self::Agency]
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Assigned,
    InProgress,
    /// Terminal; the task is immutable from here on
    Submitted,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final decision recorded by the officer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskDecision {
    Eligible,
    NotEligible,
    Verified,
    NotVerified,
}

impl TaskDecision {
    /// Whether the decision lets the application proceed.
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Eligible | Self::Verified)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eligible => "eligible",
            Self::NotEligible => "not_eligible",
            Self::Verified => "verified",
            Self::NotVerified => "not_verified",
        }
    }
}

impl fmt::Display for TaskDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location where a piece of evidence was captured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTag {
    pub latitude: f64,
    pub longitude: f64,
}

/// Reference to a captured artifact held by the evidence store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceArtifact {
    /// Opaque reference returned by the evidence store
    pub reference: String,
    /// When the artifact was captured
    pub captured_at: DateTime<Utc>,
    /// Where the artifact was captured
    pub geo_tag: GeoTag,
}

impl EvidenceArtifact {
    pub fn new(reference: impl Into<String>, captured_at: DateTime<Utc>, geo_tag: GeoTag) -> Self {
        Self {
            reference: reference.into(),
            captured_at,
            geo_tag,
        }
    }
}

/// First submission precondition that was not met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case", tag = "condition")]
pub enum UnmetCondition {
    /// Checklist items still unconfirmed
    #[error("checklist items not confirmed: {}", items.join(", "))]
    ChecklistIncomplete { items: Vec<String> },

    #[error("no evidence artifact recorded")]
    EvidenceMissing,

    #[error("visit date not recorded")]
    VisitDateMissing,

    #[error("score sheet not started")]
    ScoreSheetMissing,

    /// Indicators still unanswered, in catalog order
    #[error("score sheet incomplete, {} indicators unanswered", missing.len())]
    ScoreSheetIncomplete { missing: Vec<String> },

    /// Score sheet holds an answer the catalog does not accept
    #[error("score sheet invalid: {reason}")]
    ScoreSheetInvalid { reason: String },

    #[error("decision not recorded")]
    DecisionMissing,

    #[error("remarks are empty")]
    RemarksMissing,
}

/// Error types for task operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    /// Write or submit on a frozen task
    #[error("Task {task_id} already submitted")]
    AlreadySubmitted { task_id: String },

    /// Submission preconditions not met
    #[error("Submission of task {task_id} rejected: {condition}")]
    SubmissionRejected {
        task_id: String,
        condition: UnmetCondition,
    },

    /// Checklist item not defined for this task kind
    #[error("Checklist item {item_id} is not defined for {kind} verification")]
    UnknownChecklistItem { kind: TaskKind, item_id: String },

    /// Decision outside the kind's vocabulary
    #[error("Decision {decision} is not allowed for {kind} verification")]
    InvalidDecision { kind: TaskKind, decision: TaskDecision },

    /// Score recorded on a kind that is not scored
    #[error("{0} verification is not scored")]
    ScoringNotApplicable(TaskKind),

    /// Evidence without a reference
    #[error("Evidence reference is empty")]
    EmptyEvidenceReference,

    /// Malformed indicator answer
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),
}

pub type Result<T> = std::result::Result<T, TaskError>;
