//! Per-user session sets.
//!
//! Each user maps to a vector of [`SessionRecord`]s guarded by its own async
//! mutex, so mutations for one user are linearized while different users
//! proceed in parallel on separate map shards. Per-user entries are never
//! removed while anyone may still hold their lock handle; empty entries are
//! reclaimed only by [`SessionStore::purge_expired`] when nothing else
//! references them.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use sso_core::types::UserId;

/// One authenticated device/browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Current refresh token of this session.
    pub refresh_token: String,
    /// When the device logged in.
    pub created_at: DateTime<Utc>,
    /// When the current refresh token expires.
    pub expires_at: DateTime<Utc>,
}

type SessionSet = Arc<Mutex<Vec<SessionRecord>>>;

/// Tracks every user's live sessions.
#[derive(Debug)]
pub struct SessionStore {
    /// User → session set.
    sessions: DashMap<UserId, SessionSet>,
    /// Lifetime of a record, matching the refresh token TTL.
    record_ttl: Duration,
}

impl SessionStore {
    /// Creates an empty store whose records live as long as a refresh token.
    pub fn new(record_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            record_ttl,
        }
    }

    /// Returns the user's session set, creating it on first use.
    fn set_for(&self, user_id: UserId) -> SessionSet {
        self.sessions.entry(user_id).or_default().value().clone()
    }

    /// Returns the user's session set if one exists.
    fn existing_set(&self, user_id: &UserId) -> Option<SessionSet> {
        self.sessions.get(user_id).map(|entry| entry.value().clone())
    }

    /// Appends a session record for a new login.
    pub async fn create_session(&self, user_id: UserId, refresh_token: &str) {
        let set = self.set_for(user_id);
        let mut records = set.lock().await;

        if records.iter().any(|r| r.refresh_token == refresh_token) {
            warn!(user_id = %user_id, "Refresh token already tracked, not adding duplicate");
            return;
        }

        let now = Utc::now();
        records.push(SessionRecord {
            refresh_token: refresh_token.to_string(),
            created_at: now,
            expires_at: now + self.record_ttl,
        });

        debug!(user_id = %user_id, sessions = records.len(), "Session created");
    }

    /// Returns whether the refresh token belongs to a live session of the user.
    pub async fn has_session(&self, user_id: UserId, refresh_token: &str) -> bool {
        let Some(set) = self.existing_set(&user_id) else {
            return false;
        };
        let records = set.lock().await;
        records.iter().any(|r| r.refresh_token == refresh_token)
    }

    /// Replaces `old_token` with `new_token` in place.
    ///
    /// Returns `false` without changing anything when `old_token` is no
    /// longer tracked, which means the session was already rotated or
    /// logged out.
    pub async fn rotate_session(&self, user_id: UserId, old_token: &str, new_token: &str) -> bool {
        let Some(set) = self.existing_set(&user_id) else {
            return false;
        };
        let mut records = set.lock().await;

        let Some(record) = records.iter_mut().find(|r| r.refresh_token == old_token) else {
            return false;
        };

        record.refresh_token = new_token.to_string();
        record.expires_at = Utc::now() + self.record_ttl;
        true
    }

    /// Drops every session of the user. Returns how many were removed.
    pub async fn clear_all_sessions(&self, user_id: UserId) -> usize {
        let Some(set) = self.existing_set(&user_id) else {
            return 0;
        };
        let mut records = set.lock().await;
        let cleared = records.len();
        records.clear();
        cleared
    }

    /// Number of live sessions of the user.
    pub async fn session_count(&self, user_id: UserId) -> usize {
        match self.existing_set(&user_id) {
            Some(set) => set.lock().await.len(),
            None => 0,
        }
    }

    /// Drops records whose refresh token expired before `now` and reclaims
    /// empty per-user entries. Returns the number of records dropped.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let users: Vec<(UserId, SessionSet)> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut purged = 0;
        for (user_id, set) in users {
            let mut records = set.lock().await;
            let before = records.len();
            records.retain(|r| r.expires_at > now);
            let dropped = before - records.len();
            if dropped > 0 {
                debug!(user_id = %user_id, dropped, "Purged expired sessions");
            }
            purged += dropped;
        }

        // Only the map itself may reference a set that gets removed here; any
        // outstanding clone means a caller is about to lock it.
        self.sessions.retain(|_, set| {
            Arc::strong_count(set) > 1
                || set.try_lock().map(|records| !records.is_empty()).unwrap_or(true)
        });

        purged
    }

    /// Number of users with a tracked session set.
    pub fn user_count(&self) -> usize {
        self.sessions.len()
    }
}
