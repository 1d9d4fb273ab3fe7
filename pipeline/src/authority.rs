//! Authority roles and the operation whitelist.
//!
//! Every mutating pipeline operation maps to exactly one role in
//! [`Operation::required_role`]. Callers carry their role explicitly; there is
//! no ambient "current officer".

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ForbiddenReason, PipelineError, Result};

/// Closed set of approving authorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityRole {
    /// Independent verification agency officer
    IvaOfficer,
    /// State-level officer
    StateOfficer,
    /// Central ministry officer
    CentralOfficer,
}

impl AuthorityRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IvaOfficer => "iva_officer",
            Self::StateOfficer => "state_officer",
            Self::CentralOfficer => "central_officer",
        }
    }
}

impl fmt::Display for AuthorityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated officer acting on the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub officer_id: String,
    pub role: AuthorityRole,
    /// Whether the identity ceremony completed its second factor
    pub second_factor_verified: bool,
}

impl Caller {
    pub fn new(officer_id: impl Into<String>, role: AuthorityRole) -> Self {
        Self {
            officer_id: officer_id.into(),
            role,
            second_factor_verified: true,
        }
    }

    pub fn without_second_factor(mut self) -> Self {
        self.second_factor_verified = false;
        self
    }
}

/// Mutating operations exposed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SubmitApplication,
    CreateVerificationTask,
    RecordChecklistItem,
    RecordEvidence,
    RecordScore,
    RecordDecision,
    SubmitTask,
    ForwardToState,
    RecordStateReview,
    RecordConsent,
    ReleaseInstallment,
}

impl Operation {
    /// Role allowed to perform the operation. `None` for requester-facing
    /// operations that need no authority.
    pub fn required_role(&self) -> Option<AuthorityRole> {
        match self {
            Self::SubmitApplication => None,

            // Field verification
            Self::CreateVerificationTask
            | Self::RecordChecklistItem
            | Self::RecordEvidence
            | Self::RecordScore
            | Self::RecordDecision
            | Self::SubmitTask
            | Self::ForwardToState => Some(AuthorityRole::IvaOfficer),

            Self::RecordStateReview => Some(AuthorityRole::StateOfficer),

            Self::RecordConsent | Self::ReleaseInstallment => Some(AuthorityRole::CentralOfficer),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmitApplication => "submit_application",
            Self::CreateVerificationTask => "create_verification_task",
            Self::RecordChecklistItem => "record_checklist_item",
            Self::RecordEvidence => "record_evidence",
            Self::RecordScore => "record_score",
            Self::RecordDecision => "record_decision",
            Self::SubmitTask => "submit_task",
            Self::ForwardToState => "forward_to_state",
            Self::RecordStateReview => "record_state_review",
            Self::RecordConsent => "record_consent",
            Self::ReleaseInstallment => "release_installment",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a caller against the operation table.
pub fn authorize(caller: &Caller, operation: Operation, require_second_factor: bool) -> Result<()> {
    if let Some(required) = operation.required_role() {
        if caller.role != required {
            return Err(PipelineError::forbidden(
                operation,
                ForbiddenReason::WrongRole {
                    required,
                    actual: caller.role,
                },
            ));
        }
    }
    if require_second_factor && !caller.second_factor_verified {
        return Err(PipelineError::forbidden(
            operation,
            ForbiddenReason::SecondFactorMissing,
        ));
    }
    Ok(())
}

/// Check that the caller owns the task being written.
pub fn authorize_assignee(caller: &Caller, operation: Operation, assigned_officer: &str) -> Result<()> {
    if caller.officer_id == assigned_officer {
        Ok(())
    } else {
        Err(PipelineError::forbidden(
            operation,
            ForbiddenReason::NotAssignedOfficer {
                assigned: assigned_officer.to_string(),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_table() {
        assert_eq!(Operation::SubmitApplication.required_role(), None);
        assert_eq!(
            Operation::SubmitTask.required_role(),
            Some(AuthorityRole::IvaOfficer)
        );
        assert_eq!(
            Operation::ForwardToState.required_role(),
            Some(AuthorityRole::IvaOfficer)
        );
        assert_eq!(
            Operation::RecordStateReview.required_role(),
            Some(AuthorityRole::StateOfficer)
        );
        assert_eq!(
            Operation::RecordConsent.required_role(),
            Some(AuthorityRole::CentralOfficer)
        );
        assert_eq!(
            Operation::ReleaseInstallment.required_role(),
            Some(AuthorityRole::CentralOfficer)
        );
    }

    #[test]
    fn test_wrong_role_is_forbidden() {
        let state = Caller::new("so-1", AuthorityRole::StateOfficer);
        let err = authorize(&state, Operation::RecordConsent, true).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Forbidden {
                reason: ForbiddenReason::WrongRole {
                    required: AuthorityRole::CentralOfficer,
                    actual: AuthorityRole::StateOfficer,
                },
                ..
            }
        ));

        let central = Caller::new("co-1", AuthorityRole::CentralOfficer);
        assert!(authorize(&central, Operation::RecordConsent, true).is_ok());
    }

    #[test]
    fn test_second_factor_enforced_when_configured() {
        let iva = Caller::new("iva-1", AuthorityRole::IvaOfficer).without_second_factor();
        let err = authorize(&iva, Operation::SubmitTask, true).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Forbidden {
                reason: ForbiddenReason::SecondFactorMissing,
                ..
            }
        ));
        assert!(authorize(&iva, Operation::SubmitTask, false).is_ok());
    }

    #[test]
    fn test_assignee_check() {
        let iva = Caller::new("iva-2", AuthorityRole::IvaOfficer);
        assert!(authorize_assignee(&iva, Operation::RecordScore, "iva-2").is_ok());
        assert_eq!(
            authorize_assignee(&iva, Operation::RecordScore, "iva-1")
                .unwrap_err()
                .kind(),
            "forbidden"
        );
    }
}
