//! Repository Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use dms::{FrameStatus, SessionCounters, SessionId, SessionStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::{debug, info};

/// Driving session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub owner: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub counters: SessionCounters,
}

impl SessionRecord {
    fn new(owner: &str) -> Self {
        Self {
            id: SessionId::new(),
            owner: owner.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            counters: SessionCounters::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Default)]
struct Sessions {
    records: HashMap<SessionId, SessionRecord>,
    /// Ended sessions, oldest first
    archived: VecDeque<SessionId>,
}

/// Repository for session data (in-memory)
pub struct Repository {
    sessions: Mutex<Sessions>,
    /// Max ended sessions kept before the oldest is dropped
    max_archived_sessions: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory session repository");
        Self {
            sessions: Mutex::new(Sessions::default()),
            max_archived_sessions: 1_000,
        }
    }

    /// Create a repository keeping at most `max` ended sessions
    pub fn with_retention(max: usize) -> Self {
        Self {
            max_archived_sessions: max,
            ..Self::new()
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Sessions>, StorageError> {
        self.sessions
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))
    }

    /// Get a session record by ID
    pub fn session(&self, id: SessionId) -> Result<SessionRecord, StorageError> {
        self.lock()?
            .records
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Get sessions, newest first, optionally filtered by owner
    pub fn list_sessions(&self, owner: Option<&str>) -> Result<Vec<SessionRecord>, StorageError> {
        let sessions = self.lock()?;
        let mut records: Vec<_> = sessions
            .records
            .values()
            .filter(|r| owner.map_or(true, |o| r.owner == o))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(records)
    }

    /// Get total session count
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.records.len()).unwrap_or(0)
    }

    /// Get active session count
    pub fn active_count(&self) -> usize {
        self.sessions
            .lock()
            .map(|s| s.records.values().filter(|r| r.is_active()).count())
            .unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.records.clear();
            sessions.archived.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for Repository {
    fn create_session(&self, owner: &str) -> Result<SessionId, StoreError> {
        let record = SessionRecord::new(owner);
        let id = record.id;
        self.lock()?.records.insert(id, record);
        debug!("Created session {} for {}", id, owner);
        Ok(id)
    }

    fn increment_counters(&self, id: SessionId, drowsy: bool) -> Result<(), StoreError> {
        let mut sessions = self.lock()?;
        let record = sessions
            .records
            .get_mut(&id)
            .ok_or(StoreError::UnknownSession(id))?;

        if !record.is_active() {
            return Err(StoreError::SessionEnded(id));
        }

        record.counters.record(if drowsy {
            FrameStatus::Drowsy
        } else {
            FrameStatus::Safe
        });
        Ok(())
    }

    fn read_counters(&self, id: SessionId) -> Result<SessionCounters, StoreError> {
        self.lock()?
            .records
            .get(&id)
            .map(|r| r.counters)
            .ok_or(StoreError::UnknownSession(id))
    }

    fn end_session(&self, id: SessionId) -> Result<SessionCounters, StoreError> {
        let mut sessions = self.lock()?;
        let record = sessions
            .records
            .get_mut(&id)
            .ok_or(StoreError::UnknownSession(id))?;

        if !record.is_active() {
            return Err(StoreError::SessionEnded(id));
        }
        record.ended_at = Some(Utc::now());
        let counters = record.counters;

        // Enforce retention
        sessions.archived.push_back(id);
        while sessions.archived.len() > self.max_archived_sessions {
            if let Some(oldest) = sessions.archived.pop_front() {
                sessions.records.remove(&oldest);
                debug!("Dropped archived session {}", oldest);
            }
        }

        info!("Archived session {}", id);
        Ok(counters)
    }
}
