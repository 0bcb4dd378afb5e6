//! Eye-closure timer
//!
//! Debounces the per-frame openness ratio into SAFE/DROWSY decisions.
//! A closure only counts as drowsy once it has been sustained for longer
//! than the configured minimum duration; blinks never get that far.
//!
//! ```text
//!            ratio < threshold              elapsed > min_duration
//!   Open ─────────────────────────▶ Closing ───────────────────────▶ Drowsy
//!    ▲                                 │                               │
//!    └──── ratio >= threshold, no face, or no measurement ◀────────────┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DmsConfig;

/// Per-frame decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrameStatus {
    #[default]
    Safe,
    Drowsy,
}

impl FrameStatus {
    pub fn is_drowsy(&self) -> bool {
        matches!(self, FrameStatus::Drowsy)
    }
}

/// Closure state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosurePhase {
    #[default]
    Open,
    /// Eyes closed, not yet long enough to count
    Closing,
    Drowsy,
}

/// Closure timer for one session.
///
/// Timestamps are offsets from any fixed origin chosen by the caller
/// (session start, capture clock, ...). They only need to be monotonic
/// within a session.
#[derive(Debug, Clone)]
pub struct ClosureTimer {
    threshold: f32,
    min_duration: Duration,
    closed_since: Option<Duration>,
    phase: ClosurePhase,
}

impl ClosureTimer {
    pub fn new(threshold: f32, min_duration: Duration) -> Self {
        Self {
            threshold,
            min_duration,
            closed_since: None,
            phase: ClosurePhase::Open,
        }
    }

    pub fn from_config(config: &DmsConfig) -> Self {
        Self::new(config.ear_threshold, config.min_closed_duration())
    }

    /// Feed one openness ratio observed at `now`
    pub fn update(&mut self, ratio: f32, now: Duration) -> FrameStatus {
        if ratio >= self.threshold {
            if self.phase != ClosurePhase::Open {
                debug!(ratio, "Eyes reopened");
            }
            self.reset();
            return FrameStatus::Safe;
        }

        let Some(since) = self.closed_since else {
            debug!(ratio, ?now, "Eye closure started");
            self.closed_since = Some(now);
            self.phase = ClosurePhase::Closing;
            return FrameStatus::Safe;
        };

        // Out-of-order timestamps count as zero elapsed
        let elapsed = now.saturating_sub(since);
        if elapsed > self.min_duration {
            if self.phase != ClosurePhase::Drowsy {
                debug!(?elapsed, "Sustained eye closure");
            }
            self.phase = ClosurePhase::Drowsy;
            FrameStatus::Drowsy
        } else {
            self.phase = ClosurePhase::Closing;
            FrameStatus::Safe
        }
    }

    /// Frame without a usable face; forgets any running closure
    pub fn no_face(&mut self) -> FrameStatus {
        if self.closed_since.is_some() {
            debug!("Face lost, closure timer reset");
        }
        self.reset();
        FrameStatus::Safe
    }

    pub fn reset(&mut self) {
        self.closed_since = None;
        self.phase = ClosurePhase::Open;
    }

    pub fn phase(&self) -> ClosurePhase {
        self.phase
    }

    pub fn closed_since(&self) -> Option<Duration> {
        self.closed_since
    }

    /// How long the eyes have been closed as of `now`
    pub fn closed_for(&self, now: Duration) -> Duration {
        self.closed_since
            .map(|since| now.saturating_sub(since))
            .unwrap_or_default()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }
}

impl Default for ClosureTimer {
    fn default() -> Self {
        Self::from_config(&DmsConfig::default())
    }
}
