//! Application records and the approval state machine.
//!
//! ```text
//! Submitted → AwaitingVerification → VerificationInProgress → Verified
//!   → ForwardedToState → PendingConsent → ConsentApproved → PendingFundRelease
//!   → PartiallyFunded(1) → PartiallyFunded(2) → FullyFunded
//!
//! Verified{NotEligible}, a State rejection and ConsentRejected all end in Rejected.
//! ```
//!
//! Every transition method checks its precondition before touching the
//! record, so a failed call leaves the application unchanged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verification::TaskDecision;

use crate::authority::{AuthorityRole, Caller, Operation};
use crate::funding::{
    cumulative_percentage, installment_amount, installment_percentage, FundReleaseRecord,
    INSTALLMENT_COUNT,
};
use crate::types::{PipelineError, Result};

/// Outcome of field verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    NotEligible,
}

impl Eligibility {
    pub fn from_decision(decision: TaskDecision) -> Self {
        if decision.is_positive() {
            Self::Eligible
        } else {
            Self::NotEligible
        }
    }
}

/// Where an application sits in the approval flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ApplicationStatus {
    Submitted,
    AwaitingVerification,
    VerificationInProgress,
    Verified { eligibility: Eligibility },
    ForwardedToState,
    PendingConsent,
    ConsentApproved,
    ConsentRejected,
    PendingFundRelease,
    PartiallyFunded { installments: u8 },
    FullyFunded,
    /// Terminal
    Rejected,
}

impl ApplicationStatus {
    /// Position along the forward path. `None` for `Rejected`.
    fn stage(&self) -> Option<u8> {
        Some(match self {
            Self::Submitted => 0,
            Self::AwaitingVerification => 1,
            Self::VerificationInProgress => 2,
            Self::Verified { .. } => 3,
            Self::ForwardedToState => 4,
            Self::PendingConsent => 5,
            Self::ConsentApproved | Self::ConsentRejected => 6,
            Self::PendingFundRelease => 7,
            Self::PartiallyFunded { installments } => 7 + installments,
            Self::FullyFunded => 7 + INSTALLMENT_COUNT,
            Self::Rejected => return None,
        })
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => f.write_str("submitted"),
            Self::AwaitingVerification => f.write_str("awaiting_verification"),
            Self::VerificationInProgress => f.write_str("verification_in_progress"),
            Self::Verified {
                eligibility: Eligibility::Eligible,
            } => f.write_str("verified(eligible)"),
            Self::Verified {
                eligibility: Eligibility::NotEligible,
            } => f.write_str("verified(not_eligible)"),
            Self::ForwardedToState => f.write_str("forwarded_to_state"),
            Self::PendingConsent => f.write_str("pending_consent"),
            Self::ConsentApproved => f.write_str("consent_approved"),
            Self::ConsentRejected => f.write_str("consent_rejected"),
            Self::PendingFundRelease => f.write_str("pending_fund_release"),
            Self::PartiallyFunded { installments } => write!(f, "partially_funded({installments})"),
            Self::FullyFunded => f.write_str("fully_funded"),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

/// Requester's submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub village: String,
    #[serde(default)]
    pub block: String,
    pub district: String,
    pub state: String,
    /// Who filed the application (gram panchayat, NGO, ...)
    pub requester: String,
    /// Estimated project cost, in rupees
    pub estimated_cost: u64,
    #[serde(default)]
    pub description: String,
}

/// State officer's review of a forwarded application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum StateReview {
    Acknowledge,
    Reject { reason: String },
}

/// Recorded decision of a State or Central officer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityDecision {
    pub role: AuthorityRole,
    pub officer_id: String,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub decided_at: DateTime<Utc>,
}

impl AuthorityDecision {
    fn new(caller: &Caller, approved: bool, reason: Option<String>) -> Self {
        Self {
            role: caller.role,
            officer_id: caller.officer_id.clone(),
            approved,
            reason,
            decided_at: Utc::now(),
        }
    }
}

/// One entry of the transition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    pub authority: AuthorityRole,
    pub officer_id: String,
    pub at: DateTime<Utc>,
}

/// A village development application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub village: String,
    pub block: String,
    pub district: String,
    pub state: String,
    pub requester: String,
    /// Estimated project cost, in rupees
    pub estimated_cost: u64,
    pub description: String,
    pub status: ApplicationStatus,
    /// Verification tasks opened for this application, in creation order
    pub task_ids: Vec<String>,
    pub state_review: Option<AuthorityDecision>,
    pub consent: Option<AuthorityDecision>,
    pub fund_releases: Vec<FundReleaseRecord>,
    pub history: Vec<StateChange>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Accept a requester's submission.
    pub fn submit(new: NewApplication) -> Result<Self> {
        for (field, value) in [
            ("village", &new.village),
            ("district", &new.district),
            ("state", &new.state),
            ("requester", &new.requester),
        ] {
            if value.trim().is_empty() {
                return Err(PipelineError::InvalidApplication(format!("{field} is empty")));
            }
        }
        if new.estimated_cost == 0 {
            return Err(PipelineError::InvalidApplication(
                "estimated_cost must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            village: new.village,
            block: new.block,
            district: new.district,
            state: new.state,
            requester: new.requester,
            estimated_cost: new.estimated_cost,
            description: new.description,
            status: ApplicationStatus::Submitted,
            task_ids: Vec::new(),
            state_review: None,
            consent: None,
            fund_releases: Vec::new(),
            history: Vec::new(),
            submitted_at: now,
            updated_at: now,
        })
    }

    /// Sum released so far.
    pub fn released_amount(&self) -> u64 {
        self.fund_releases.iter().map(|r| r.amount).sum()
    }

    /// Fail unless the application is in `required`.
    ///
    /// An application already past `required` on the forward path reports
    /// `AlreadyInState`; anything else, including `Rejected`, is an invalid
    /// transition.
    pub fn expect_status(&self, operation: Operation, required: ApplicationStatus) -> Result<()> {
        if self.status == required {
            return Ok(());
        }
        match (self.status.stage(), required.stage()) {
            (Some(current), Some(wanted)) if current > wanted => Err(PipelineError::AlreadyInState {
                application_id: self.id.clone(),
                state: self.status,
            }),
            _ => Err(self.invalid(operation)),
        }
    }

    /// Fail if the application has been rejected.
    pub fn ensure_active(&self, operation: Operation) -> Result<()> {
        if self.status == ApplicationStatus::Rejected {
            Err(self.invalid(operation))
        } else {
            Ok(())
        }
    }

    /// Open verification. Called for every task created.
    pub fn open_verification(&mut self, caller: &Caller) -> Result<()> {
        match self.status {
            ApplicationStatus::Submitted => {
                self.transition(ApplicationStatus::AwaitingVerification, caller);
                Ok(())
            }
            ApplicationStatus::AwaitingVerification | ApplicationStatus::VerificationInProgress => {
                Ok(())
            }
            _ => Err(self.invalid(Operation::CreateVerificationTask)),
        }
    }

    /// First field write on any task.
    pub fn verification_started(&mut self, caller: &Caller) {
        if self.status == ApplicationStatus::AwaitingVerification {
            self.transition(ApplicationStatus::VerificationInProgress, caller);
        }
    }

    /// Close verification with its outcome. A negative outcome rejects the
    /// application in the same step.
    pub fn complete_verification(&mut self, eligibility: Eligibility, caller: &Caller) -> Result<()> {
        self.expect_status(Operation::SubmitTask, ApplicationStatus::VerificationInProgress)?;

        self.transition(ApplicationStatus::Verified { eligibility }, caller);
        if eligibility == Eligibility::NotEligible {
            self.transition(ApplicationStatus::Rejected, caller);
        }
        Ok(())
    }

    pub fn forward_to_state(&mut self, caller: &Caller) -> Result<()> {
        self.expect_status(
            Operation::ForwardToState,
            ApplicationStatus::Verified {
                eligibility: Eligibility::Eligible,
            },
        )?;
        self.transition(ApplicationStatus::ForwardedToState, caller);
        Ok(())
    }

    pub fn record_state_review(&mut self, review: StateReview, caller: &Caller) -> Result<()> {
        self.expect_status(Operation::RecordStateReview, ApplicationStatus::ForwardedToState)?;

        match review {
            StateReview::Acknowledge => {
                self.state_review = Some(AuthorityDecision::new(caller, true, None));
                self.transition(ApplicationStatus::PendingConsent, caller);
            }
            StateReview::Reject { reason } => {
                self.state_review = Some(AuthorityDecision::new(caller, false, Some(reason)));
                self.transition(ApplicationStatus::Rejected, caller);
            }
        }
        Ok(())
    }

    pub fn record_consent(&mut self, approved: bool, caller: &Caller) -> Result<()> {
        self.expect_status(Operation::RecordConsent, ApplicationStatus::PendingConsent)?;

        self.consent = Some(AuthorityDecision::new(caller, approved, None));
        if approved {
            self.transition(ApplicationStatus::ConsentApproved, caller);
            self.transition(ApplicationStatus::PendingFundRelease, caller);
        } else {
            self.transition(ApplicationStatus::ConsentRejected, caller);
            self.transition(ApplicationStatus::Rejected, caller);
        }
        Ok(())
    }

    /// Release an installment. `None` releases the next one due.
    pub fn release_installment(
        &mut self,
        installment: Option<u8>,
        caller: &Caller,
    ) -> Result<FundReleaseRecord> {
        let funding = matches!(
            self.status,
            ApplicationStatus::PendingFundRelease
                | ApplicationStatus::PartiallyFunded { .. }
                | ApplicationStatus::FullyFunded
        );
        if !funding {
            return Err(self.invalid(Operation::ReleaseInstallment));
        }

        let released = self.fund_releases.len() as u8;
        let expected = released + 1;
        let requested = installment.unwrap_or(expected);

        if requested > INSTALLMENT_COUNT {
            return Err(PipelineError::ScheduleExhausted {
                application_id: self.id.clone(),
            });
        }
        if requested == 0 || requested > expected {
            return Err(PipelineError::OutOfOrderInstallment {
                application_id: self.id.clone(),
                requested,
                expected,
            });
        }
        if requested < expected {
            return Err(PipelineError::AlreadyInState {
                application_id: self.id.clone(),
                state: self.status,
            });
        }

        let (percentage, amount) = installment_percentage(requested)
            .zip(installment_amount(
                self.estimated_cost,
                requested,
                self.released_amount(),
            ))
            .ok_or(PipelineError::ScheduleExhausted {
                application_id: self.id.clone(),
            })?;

        let record = FundReleaseRecord {
            installment: requested,
            percentage,
            amount,
            cumulative_percentage: cumulative_percentage(requested),
            released_by: caller.officer_id.clone(),
            released_at: Utc::now(),
        };
        self.fund_releases.push(record.clone());

        let next = if requested == INSTALLMENT_COUNT {
            ApplicationStatus::FullyFunded
        } else {
            ApplicationStatus::PartiallyFunded {
                installments: requested,
            }
        };
        self.transition(next, caller);
        Ok(record)
    }

    fn transition(&mut self, to: ApplicationStatus, caller: &Caller) {
        let at = Utc::now();
        self.history.push(StateChange {
            from: self.status,
            to,
            authority: caller.role,
            officer_id: caller.officer_id.clone(),
            at,
        });
        self.status = to;
        self.updated_at = at;
    }

    fn invalid(&self, operation: Operation) -> PipelineError {
        PipelineError::InvalidTransition {
            application_id: self.id.clone(),
            from: self.status,
            operation,
        }
    }
}
