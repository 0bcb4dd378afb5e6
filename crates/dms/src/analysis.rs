//! Per-frame analysis result

use serde::{Deserialize, Serialize};

use crate::closure::{ClosurePhase, FrameStatus};
use crate::ratio::EyeMeasurement;
use crate::store::SessionId;

/// Result of analyzing one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub session_id: SessionId,

    pub status: FrameStatus,

    /// Closure timer phase after this frame
    pub phase: ClosurePhase,

    /// Whether the landmark source found a face
    pub face_detected: bool,

    /// Whether a usable openness ratio was obtained
    pub measured: bool,

    /// Mean openness of both eyes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_ratio: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_ratio: Option<f32>,
}

impl FrameAnalysis {
    pub(crate) fn new(session_id: SessionId, status: FrameStatus, phase: ClosurePhase) -> Self {
        Self {
            session_id,
            status,
            phase,
            face_detected: false,
            measured: false,
            ratio: None,
            left_ratio: None,
            right_ratio: None,
        }
    }

    pub(crate) fn with_eyes(mut self, eyes: &EyeMeasurement) -> Self {
        self.left_ratio = Some(eyes.left);
        self.right_ratio = Some(eyes.right);
        self
    }

    pub fn is_drowsy(&self) -> bool {
        self.status.is_drowsy()
    }
}
