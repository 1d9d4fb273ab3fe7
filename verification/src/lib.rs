//! Verification Task Lifecycle
//!
//! One task per field verification of an application: the village itself,
//! its implementing committee, or the executing agency. The assigned officer
//! confirms checklist items, records evidence and (for village tasks) answers
//! the indicator catalog, then submits an explicit decision.
//!
//! ```text
//!   Assigned ──(first checklist/evidence write)──▶ InProgress ──(submit)──▶ Submitted
//! ```
//!
//! A submitted task is frozen: every further write fails with
//! [`TaskError::AlreadySubmitted`].

pub mod checklist;
pub mod task;
pub mod types;

pub use checklist::checklist_items;
pub use task::{Progress, VerificationTask};
pub use types::*;
