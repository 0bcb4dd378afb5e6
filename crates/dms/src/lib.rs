//! Driver Monitoring System (DMS)
//!
//! Drowsiness estimation from facial landmarks:
//! - Eye openness ratio from six-point eye contours
//! - Debounced eye-closure timer per driving session
//! - Session counters and safety score
//!
//! Face detection itself is pluggable through [`LandmarkSource`];
//! session persistence through [`SessionStore`].

pub mod analysis;
pub mod closure;
pub mod config;
pub mod landmarks;
pub mod monitor;
pub mod ratio;
pub mod session;
pub mod store;

pub use analysis::FrameAnalysis;
pub use closure::{ClosurePhase, ClosureTimer, FrameStatus};
pub use config::DmsConfig;
pub use landmarks::{EyeLandmarks, FaceLandmarks, LandmarkScheme, LandmarkSource, Point};
pub use monitor::DrowsinessMonitor;
pub use ratio::{eye_ratio, face_ratio, EyeMeasurement};
pub use session::{SessionCounters, SessionSummary};
pub use store::{SessionId, SessionStore, StoreError};

use thiserror::Error;

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Outer and inner eye corners coincide
    #[error("Degenerate eye geometry: zero horizontal eye width")]
    DegenerateGeometry,

    #[error("Expected {expected} eye landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("No active session {0}")]
    NoActiveSession(SessionId),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),
}
