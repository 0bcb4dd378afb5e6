//! Recorded frame traces
//!
//! One JSON object per line:
//!
//! ```text
//! {"t": 0.0, "left": [[x, y], ...6], "right": [[x, y], ...6]}
//! {"t": 0.1, "mesh": [[x, y], ...]}
//! {"t": 0.2, "ratio": 0.18}
//! {"t": 0.3, "face": null}
//! ```
//!
//! A line with no eyes, mesh or ratio is a frame without a face.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use dms::{FaceLandmarks, LandmarkScheme, Point};
use serde::Deserialize;

/// One recorded frame
#[derive(Debug, Clone, Deserialize)]
pub struct TraceFrame {
    /// Capture time in seconds
    pub t: f64,
    #[serde(default)]
    pub left: Option<Vec<[f32; 2]>>,
    #[serde(default)]
    pub right: Option<Vec<[f32; 2]>>,
    /// Full face landmark set
    #[serde(default)]
    pub mesh: Option<Vec<[f32; 2]>>,
    #[serde(default)]
    pub ratio: Option<f32>,
    #[serde(skip)]
    timestamp: Duration,
}

/// What the monitor should be fed for a frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    Landmarks(Option<FaceLandmarks>),
    Ratio(f32),
}

fn points(raw: &[[f32; 2]]) -> Vec<Point> {
    raw.iter().copied().map(Point::from).collect()
}

impl TraceFrame {
    pub fn parse(line: &str) -> Result<Self> {
        let mut frame: Self = serde_json::from_str(line).context("Malformed trace line")?;
        frame.timestamp = match Duration::try_from_secs_f64(frame.t) {
            Ok(timestamp) => timestamp,
            Err(_) => bail!("Invalid timestamp {}", frame.t),
        };
        Ok(frame)
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn input(&self, scheme: LandmarkScheme) -> FrameInput {
        if let Some(ratio) = self.ratio {
            return FrameInput::Ratio(ratio);
        }

        if let Some(mesh) = &self.mesh {
            // A partial mesh still means a face was seen; give the monitor
            // whatever eyes it has so it records an unmeasured frame
            let face = FaceLandmarks::from_mesh(&points(mesh), scheme)
                .unwrap_or_else(|_| FaceLandmarks::default());
            return FrameInput::Landmarks(Some(face));
        }

        match (&self.left, &self.right) {
            (None, None) => FrameInput::Landmarks(None),
            (left, right) => FrameInput::Landmarks(Some(FaceLandmarks::new(
                left.as_deref().map(points).unwrap_or_default(),
                right.as_deref().map(points).unwrap_or_default(),
            ))),
        }
    }
}
