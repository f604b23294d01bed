//! Session Store
//!
//! Concurrent registry of opaque session tokens with sliding expiration.
//!
//! Each token lives in one shard of a [`DashMap`]; validate-and-refresh runs
//! under that shard's write lock, so operations on the same token are
//! linearizable while distinct tokens do not contend on a global lock.
//!
//! A token is either present and active or absent. Expiry is detected the next
//! time the token is touched (or by [`SessionStore::sweep_expired`]) and the
//! record is removed on the spot; an expired token never becomes valid again.

use crate::clock::{Clock, SystemClock};
use crate::error::SessionError;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Header carrying the session token on inbound requests
pub const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

/// Session store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Idle time after which a session expires
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(30),
        }
    }
}

/// State kept per token
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Who the session was opened for
    pub subject: String,

    /// When the session was opened
    pub created_at: DateTime<Utc>,

    /// Last successful validation (or creation)
    pub last_access: DateTime<Utc>,
}

impl SessionRecord {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.last_access + ttl < now
    }
}

/// Registry of active sessions
#[derive(Debug)]
pub struct SessionStore {
    config: SessionConfig,
    // Map: token -> SessionRecord
    sessions: DashMap<String, SessionRecord>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Create an empty store using the wall clock
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an empty store driven by `clock`
    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            clock,
        }
    }

    /// Idle timeout
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Open a session for `subject` and return its token.
    ///
    /// Tokens are random v4 UUIDs and carry no information about the subject.
    pub fn create(&self, subject: &str) -> String {
        let now = self.clock.now();

        loop {
            let token = Uuid::new_v4().to_string();
            if let Entry::Vacant(slot) = self.sessions.entry(token.clone()) {
                slot.insert(SessionRecord {
                    subject: subject.to_string(),
                    created_at: now,
                    last_access: now,
                });
                debug!("Session created for {}", subject);
                return token;
            }
        }
    }

    /// Check `token` and, when active, slide its expiry forward.
    ///
    /// Returns `false` for empty, unknown or expired tokens. Expired records
    /// are removed.
    pub fn validate(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        let now = self.clock.now();
        let ttl = self.config.ttl;

        match self.sessions.entry(token.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_expired(now, ttl) {
                    let record = entry.remove();
                    debug!(
                        "Session for {} expired (last access {})",
                        record.subject, record.last_access
                    );
                    false
                } else {
                    let record = entry.get_mut();
                    // concurrent validators may read the clock out of order
                    if now > record.last_access {
                        record.last_access = now;
                    }
                    true
                }
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Authorize a request carrying an optional token
    pub fn authorize(&self, token: Option<&str>) -> Result<(), SessionError> {
        match token {
            None | Some("") => Err(SessionError::MissingToken),
            Some(t) if self.validate(t) => Ok(()),
            Some(_) => Err(SessionError::InvalidOrExpired),
        }
    }

    /// Remove `token`. Unknown tokens are ignored.
    pub fn invalidate(&self, token: &str) {
        if self.sessions.remove(token).is_some() {
            debug!("Session invalidated");
        }
    }

    /// Remove every expired session and return how many were dropped
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let mut removed = 0;

        self.sessions.retain(|_, record| {
            let keep = !record.is_expired(now, ttl);
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            info!("Swept {} expired sessions", removed);
        }
        removed
    }

    /// Number of sessions currently held, expired-but-unswept included
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is held
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Copy of the record behind `token`, without refreshing it
    pub fn peek(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.get(token).map(|r| r.value().clone())
    }
}
