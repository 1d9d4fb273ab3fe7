//! Session-based identity resolution.
//!
//! The identity ceremony (credentials plus second factor) happens outside the
//! pipeline. Its outcome is recorded here with [`SessionStore::open_session`]
//! and later resolved to a [`Caller`] by token.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

use crate::authority::{AuthorityRole, Caller};
use crate::types::{ForbiddenReason, PipelineError, Result};

/// Resolves a session token to the officer behind it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Caller>;
}

#[derive(Debug, Clone)]
struct Session {
    caller: Caller,
    opened_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// In-process session registry.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Record a completed identity ceremony and return the session token.
    ///
    /// Fails when the configured lifetime cannot be represented as an expiry time.
    pub fn open_session(
        &self,
        officer_id: impl Into<String>,
        role: AuthorityRole,
        second_factor_verified: bool,
    ) -> Result<String> {
        let opened_at = Utc::now();
        let expires_at = chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| opened_at.checked_add_signed(ttl))
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "session lifetime of {}s is out of range",
                    self.ttl.as_secs()
                ))
            })?;

        let token = uuid::Uuid::new_v4().to_string();
        let caller = Caller {
            officer_id: officer_id.into(),
            role,
            second_factor_verified,
        };

        info!(officer_id = %caller.officer_id, role = %role, second_factor_verified, "Session opened");
        self.sessions.insert(
            token.clone(),
            Session {
                caller,
                opened_at,
                expires_at,
            },
        );
        Ok(token)
    }

    /// End a session. Returns whether it existed.
    pub fn close_session(&self, token: &str) -> bool {
        match self.sessions.remove(token) {
            Some((_, session)) => {
                info!(
                    officer_id = %session.caller.officer_id,
                    duration_secs = (Utc::now() - session.opened_at).num_seconds(),
                    "Session closed"
                );
                true
            }
            None => false,
        }
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!(removed, "Expired sessions pruned");
        }
        removed
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl IdentityProvider for SessionStore {
    async fn resolve(&self, token: &str) -> Result<Caller> {
        let session = self
            .sessions
            .get(token)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| session_error(ForbiddenReason::UnknownSession))?;

        if session.expires_at <= Utc::now() {
            self.sessions.remove(token);
            return Err(session_error(ForbiddenReason::SessionExpired));
        }
        Ok(session.caller)
    }
}

fn session_error(reason: ForbiddenReason) -> PipelineError {
    PipelineError::Unauthenticated { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_resolve_close() {
        let store = SessionStore::new(Duration::from_secs(3600));
        let token = store
            .open_session("co-1", AuthorityRole::CentralOfficer, true)
            .unwrap();

        let caller = store.resolve(&token).await.unwrap();
        assert_eq!(caller.officer_id, "co-1");
        assert_eq!(caller.role, AuthorityRole::CentralOfficer);
        assert!(caller.second_factor_verified);

        assert!(store.close_session(&token));
        assert!(!store.close_session(&token));
        let err = store.resolve(&token).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Unauthenticated {
                reason: ForbiddenReason::UnknownSession
            }
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_refused() {
        let store = SessionStore::new(Duration::ZERO);
        let token = store
            .open_session("iva-1", AuthorityRole::IvaOfficer, true)
            .unwrap();

        let err = store.resolve(&token).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Unauthenticated {
                reason: ForbiddenReason::SessionExpired
            }
        ));
        assert_eq!(store.active_sessions(), 0);
    }

    #[test]
    fn test_prune_expired() {
        let store = SessionStore::new(Duration::ZERO);
        store
            .open_session("iva-1", AuthorityRole::IvaOfficer, false)
            .unwrap();
        store
            .open_session("so-1", AuthorityRole::StateOfficer, true)
            .unwrap();
        assert_eq!(store.prune_expired(), 2);
        assert_eq!(store.active_sessions(), 0);
    }

    #[test]
    fn test_unrepresentable_lifetime_is_refused() {
        let store = SessionStore::new(Duration::from_secs(1_000_000_000_000_000));
        let err = store
            .open_session("iva-1", AuthorityRole::IvaOfficer, true)
            .unwrap_err();
        assert_eq!(err.kind(), "config");
        assert_eq!(store.active_sessions(), 0);
    }
}
