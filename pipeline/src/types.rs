//! Error and identifier types shared across the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use indicators::{CatalogError, ScoringError};
use verification::{TaskDecision, TaskError, TaskKind, UnmetCondition};

use crate::application::ApplicationStatus;
use crate::authority::{AuthorityRole, Operation};

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Application,
    VerificationTask,
    Indicator,
    ChecklistItem,
    Session,
    Evidence,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Application => "application",
            Self::VerificationTask => "verification task",
            Self::Indicator => "indicator",
            Self::ChecklistItem => "checklist item",
            Self::Session => "session",
            Self::Evidence => "evidence",
        })
    }
}

/// Why a caller was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum ForbiddenReason {
    #[error("requires {required}, caller holds {actual}")]
    WrongRole {
        required: AuthorityRole,
        actual: AuthorityRole,
    },

    #[error("second factor not verified")]
    SecondFactorMissing,

    /// Task writes are restricted to the assigned officer
    #[error("task is assigned to {assigned}")]
    NotAssignedOfficer { assigned: String },

    #[error("session unknown or closed")]
    UnknownSession,

    #[error("session expired")]
    SessionExpired,
}

/// Error types for pipeline operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Indicator answer outside the option list
    #[error("Option {option_index} is not valid for indicator {indicator_id} ({available} options)")]
    InvalidOption {
        indicator_id: String,
        option_index: usize,
        available: usize,
    },

    #[error("Score sheet incomplete, {} indicators unanswered", missing.len())]
    IncompleteScoreSheet { missing: Vec<String> },

    #[error("Submission of task {task_id} rejected: {condition}")]
    SubmissionRejected {
        task_id: String,
        condition: UnmetCondition,
    },

    #[error("Task {task_id} already submitted")]
    AlreadySubmitted { task_id: String },

    #[error("Installment {requested} requested for {application_id}, next due is {expected}")]
    OutOfOrderInstallment {
        application_id: String,
        requested: u8,
        expected: u8,
    },

    #[error("Fund release schedule exhausted for {application_id}")]
    ScheduleExhausted { application_id: String },

    #[error("Forbidden: {operation}: {reason}")]
    Forbidden {
        operation: Operation,
        reason: ForbiddenReason,
    },

    /// Session token could not be resolved to an officer
    #[error("Forbidden: {reason}")]
    Unauthenticated { reason: ForbiddenReason },

    /// The same transition was already applied
    #[error("Application {application_id} already in state {state}")]
    AlreadyInState {
        application_id: String,
        state: ApplicationStatus,
    },

    #[error("Cannot {operation} application {application_id} in state {from}")]
    InvalidTransition {
        application_id: String,
        from: ApplicationStatus,
        operation: Operation,
    },

    #[error("A {kind} verification task ({task_id}) is already open for {application_id}")]
    TaskAlreadyOpen {
        application_id: String,
        kind: TaskKind,
        task_id: String,
    },

    #[error("Decision {decision} is not allowed for {kind} verification")]
    InvalidDecision { kind: TaskKind, decision: TaskDecision },

    #[error("{0} verification is not scored")]
    ScoringNotApplicable(TaskKind),

    #[error("Invalid evidence: {0}")]
    InvalidEvidence(String),

    #[error("Invalid application: {0}")]
    InvalidApplication(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn application_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::Application,
            id: id.to_string(),
        }
    }

    pub(crate) fn task_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::VerificationTask,
            id: id.to_string(),
        }
    }

    pub(crate) fn forbidden(operation: Operation, reason: ForbiddenReason) -> Self {
        Self::Forbidden { operation, reason }
    }

    /// Short machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidOption { .. } => "invalid_option",
            Self::IncompleteScoreSheet { .. } => "incomplete_score_sheet",
            Self::SubmissionRejected { .. } => "submission_rejected",
            Self::AlreadySubmitted { .. } => "already_submitted",
            Self::OutOfOrderInstallment { .. } => "out_of_order_installment",
            Self::ScheduleExhausted { .. } => "schedule_exhausted",
            Self::Forbidden { .. } | Self::Unauthenticated { .. } => "forbidden",
            Self::AlreadyInState { .. } => "already_in_state",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::TaskAlreadyOpen { .. } => "task_already_open",
            Self::InvalidDecision { .. } => "invalid_decision",
            Self::ScoringNotApplicable(_) => "scoring_not_applicable",
            Self::InvalidEvidence(_) => "invalid_evidence",
            Self::InvalidApplication(_) => "invalid_application",
            Self::Catalog(_) => "catalog",
            Self::Config(_) => "config",
        }
    }
}

impl From<ScoringError> for PipelineError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::IncompleteScoreSheet { missing } => Self::IncompleteScoreSheet { missing },
            ScoringError::UnknownIndicator(id) => Self::NotFound {
                kind: EntityKind::Indicator,
                id,
            },
            ScoringError::InvalidOption {
                indicator_id,
                option_index,
                available,
            } => Self::InvalidOption {
                indicator_id,
                option_index,
                available,
            },
        }
    }
}

impl From<TaskError> for PipelineError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::AlreadySubmitted { task_id } => Self::AlreadySubmitted { task_id },
            TaskError::SubmissionRejected { task_id, condition } => {
                Self::SubmissionRejected { task_id, condition }
            }
            TaskError::UnknownChecklistItem { kind, item_id } => Self::NotFound {
                kind: EntityKind::ChecklistItem,
                id: format!("{kind}/{item_id}"),
            },
            TaskError::InvalidDecision { kind, decision } => Self::InvalidDecision { kind, decision },
            TaskError::ScoringNotApplicable(kind) => Self::ScoringNotApplicable(kind),
            TaskError::EmptyEvidenceReference => {
                Self::InvalidEvidence("evidence reference is empty".to_string())
            }
            TaskError::Scoring(err) => err.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_errors_keep_their_kind() {
        let err: PipelineError = TaskError::AlreadySubmitted {
            task_id: "t-1".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "already_submitted");

        let err: PipelineError = TaskError::Scoring(ScoringError::InvalidOption {
            indicator_id: "ws-piped-water".to_string(),
            option_index: 5,
            available: 2,
        })
        .into();
        assert!(matches!(
            err,
            PipelineError::InvalidOption { option_index: 5, .. }
        ));
    }

    #[test]
    fn test_forbidden_message_names_reason() {
        let err = PipelineError::forbidden(
            Operation::RecordConsent,
            ForbiddenReason::WrongRole {
                required: AuthorityRole::CentralOfficer,
                actual: AuthorityRole::StateOfficer,
            },
        );
        let message = err.to_string();
        assert!(message.contains("record_consent"));
        assert!(message.contains("central_officer"));
    }
}
