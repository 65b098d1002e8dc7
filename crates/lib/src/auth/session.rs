//! In-process session tokens
//!
//! Maps random session tokens to the principal that logged in. Sessions are
//! ephemeral and lost on restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialError, CredentialVerifier};
use crate::clock::{Clock, SystemClock, millis_to_rfc3339};
use crate::constants::DEFAULT_SESSION_TTL_SECS;
use crate::rbac::PrincipalId;

/// An issued session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: String,
    pub principal: PrincipalId,
    pub expires_at_millis: u64,
}

impl Session {
    /// Expiry as an RFC 3339 timestamp.
    pub fn expires_at(&self) -> String {
        millis_to_rfc3339(self.expires_at_millis)
    }
}

/// In-memory session store
///
/// Clones share the same sessions.
#[derive(Clone, Debug)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a new session for a principal
    ///
    /// Generates a random UUID token valid for the store's TTL.
    pub async fn create_session(&self, principal: PrincipalId) -> Session {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            principal,
            expires_at_millis: self
                .clock
                .now_millis()
                .saturating_add(self.ttl.as_millis() as u64),
        };
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token.clone(), session.clone());
        tracing::debug!(principal = %session.principal, "Session created");
        session
    }

    /// Remove a session. Returns whether it existed.
    pub async fn destroy_session(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token).is_some()
    }

    /// Drop every expired session, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at_millis > now);
        before - sessions.len()
    }

    /// Get the number of stored sessions, expired ones included
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }
}

#[async_trait]
impl CredentialVerifier for SessionStore {
    async fn verify(&self, token: &str) -> Result<PrincipalId, CredentialError> {
        let now = self.clock.now_millis();
        let sessions = self.sessions.read().await;
        let session = sessions.get(token).ok_or(CredentialError::UnknownToken)?;
        if session.expires_at_millis <= now {
            return Err(CredentialError::Expired);
        }
        Ok(session.principal.clone())
    }
}
