//! Per-session counters and safety score

use serde::{Deserialize, Serialize};

use crate::closure::FrameStatus;
use crate::store::SessionId;

/// Analyzed frame counters for one driving session.
///
/// `drowsy_events <= total_checks` always holds; the fields are only
/// mutated through [`SessionCounters::record`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    total_checks: u64,
    drowsy_events: u64,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one analyzed frame
    pub fn record(&mut self, status: FrameStatus) {
        self.total_checks += 1;
        if status.is_drowsy() {
            self.drowsy_events += 1;
        }
    }

    pub fn total_checks(&self) -> u64 {
        self.total_checks
    }

    pub fn drowsy_events(&self) -> u64 {
        self.drowsy_events
    }

    /// Percentage of non-drowsy checks, rounded to 2 decimals. 100 with no checks.
    pub fn score(&self) -> f64 {
        if self.total_checks == 0 {
            return 100.0;
        }
        let safe_fraction = 1.0 - self.drowsy_events as f64 / self.total_checks as f64;
        (safe_fraction * 100.0 * 100.0).round() / 100.0
    }

    pub fn summary(&self, session_id: SessionId) -> SessionSummary {
        SessionSummary {
            session_id,
            total_checks: self.total_checks,
            drowsy_events: self.drowsy_events,
            safety_score: self.score(),
        }
    }
}

/// Session report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub total_checks: u64,
    pub drowsy_events: u64,
    pub safety_score: f64,
}
