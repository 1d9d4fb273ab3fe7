//! Multi-authority approval pipeline for village development applications.
//!
//! An application is field-verified by an independent verification agency
//! (IVA), forwarded to the State, consented to by the Centre and then funded
//! in three installments:
//!
//! ```text
//!  requester        IVA officer            State officer     Central officer
//!  ─────────        ───────────            ─────────────     ───────────────
//!  submit ──▶ tasks ─▶ checklist/evidence
//!                      score/decision
//!                      submit ─▶ Verified
//!                      forward ───────────▶ acknowledge ───▶ consent
//!                                                            release × 3
//! ```
//!
//! [`ApprovalService`] owns every record. Callers act through explicit
//! [`Caller`] values checked against [`Operation::required_role`]; committed
//! changes are announced on an [`EventSink`].

pub mod application;
pub mod audit;
pub mod authority;
pub mod cli;
pub mod config;
pub mod events;
pub mod evidence;
pub mod funding;
pub mod replay;
pub mod service;
pub mod session;
pub mod types;

// Re-export main types
pub use application::{Application, ApplicationStatus, Eligibility, NewApplication, StateReview};
pub use audit::{AuditEntry, AuditLog, AuditOutcome, AuditStats};
pub use authority::{AuthorityRole, Caller, Operation};
pub use config::PipelineConfig;
pub use events::{
    BroadcastEventSink, EventSink, FanoutEventSink, LifecycleEvent, MemoryEventSink,
    TracingEventSink,
};
pub use evidence::{EvidenceStore, EvidenceUpload, MemoryEvidenceStore};
pub use funding::{FundReleaseRecord, INSTALLMENT_SCHEDULE};
pub use service::ApprovalService;
pub use session::{IdentityProvider, SessionStore};
pub use types::{EntityKind, ForbiddenReason, PipelineError, Result};
