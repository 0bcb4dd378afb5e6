//! Session store boundary
//!
//! The monitor records every analyzed frame through a [`SessionStore`];
//! how sessions are persisted is up to the implementation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::session::SessionCounters;

/// Driving session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Session store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Unknown session {0}")]
    UnknownSession(SessionId),

    #[error("Session {0} has ended")]
    SessionEnded(SessionId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Session persistence used by the monitor
pub trait SessionStore: Send + Sync {
    /// Open a new session for `owner`
    fn create_session(&self, owner: &str) -> Result<SessionId, StoreError>;

    /// Count one analyzed frame, drowsy or not
    fn increment_counters(&self, id: SessionId, drowsy: bool) -> Result<(), StoreError>;

    fn read_counters(&self, id: SessionId) -> Result<SessionCounters, StoreError>;

    /// Close the session; its counters stay readable
    fn end_session(&self, id: SessionId) -> Result<SessionCounters, StoreError>;
}
