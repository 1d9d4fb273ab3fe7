//! Audit trail for pipeline operations.
//!
//! Every mutating call is recorded with its outcome, whether it was committed
//! or refused.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::authority::{AuthorityRole, Caller, Operation};
use crate::types::PipelineError;

/// Maximum entries in the audit log before pruning.
const MAX_AUDIT_ENTRIES: usize = 10_000;

/// How an audited call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum AuditOutcome {
    Committed,
    /// Refused before anything changed
    Refused { kind: String, message: String },
}

impl AuditOutcome {
    pub fn from_result<T>(result: &Result<T, PipelineError>) -> Self {
        match result {
            Ok(_) => Self::Committed,
            Err(err) => Self::Refused {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// An entry in the audit log.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Unique entry ID
    pub entry_id: String,
    pub operation: Operation,
    /// Acting officer (absent for requester submissions)
    pub officer_id: Option<String>,
    pub role: Option<AuthorityRole>,
    /// Application or task the call targeted
    pub target_id: String,
    pub outcome: AuditOutcome,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        operation: Operation,
        caller: Option<&Caller>,
        target_id: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            operation,
            officer_id: caller.map(|c| c.officer_id.clone()),
            role: caller.map(|c| c.role),
            target_id: target_id.into(),
            outcome,
            recorded_at: Utc::now(),
        }
    }
}

/// Audit log for tracking all pipeline operations.
pub struct AuditLog {
    /// Log entries (newest first)
    entries: Arc<RwLock<VecDeque<AuditEntry>>>,
    /// Maximum entries to retain
    max_entries: usize,
}

impl AuditLog {
    /// Create a new audit log.
    pub fn new() -> Self {
        Self::with_max_entries(MAX_AUDIT_ENTRIES)
    }

    /// Create with custom max entries.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            max_entries,
        }
    }

    /// Append an entry, pruning the oldest beyond the limit.
    pub async fn record(&self, entry: AuditEntry) {
        let mut entries = self.entries.write().await;
        entries.push_front(entry);

        while entries.len() > self.max_entries {
            entries.pop_back();
        }
    }

    /// Get recent entries.
    pub async fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries.iter().take(limit).cloned().collect()
    }

    /// Entries that targeted one application or task.
    pub async fn for_target(&self, target_id: &str) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.target_id == target_id)
            .cloned()
            .collect()
    }

    /// Get statistics.
    pub async fn stats(&self) -> AuditStats {
        let entries = self.entries.read().await;

        let total = entries.len();
        let committed = entries.iter().filter(|e| e.outcome.is_committed()).count();
        let forbidden = entries
            .iter()
            .filter(|e| matches!(&e.outcome, AuditOutcome::Refused { kind, .. } if kind == "forbidden"))
            .count();

        AuditStats {
            total_operations: total,
            committed,
            refused: total - committed,
            forbidden,
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub total_operations: usize,
    pub committed: usize,
    /// Calls that failed for any reason
    pub refused: usize,
    /// Subset of refused calls denied by the authority check
    pub forbidden: usize,
}
