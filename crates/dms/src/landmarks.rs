//! Facial landmark types and the landmark source boundary

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Points per eye contour
pub const EYE_POINTS: usize = 6;

/// 2-D landmark position in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

/// Six-point eye contour.
///
/// Order: outer corner, upper lid (two points), inner corner,
/// lower lid (two points). Points are never reordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks(pub [Point; EYE_POINTS]);

impl EyeLandmarks {
    pub fn points(&self) -> &[Point; EYE_POINTS] {
        &self.0
    }
}

impl TryFrom<&[Point]> for EyeLandmarks {
    type Error = DmsError;

    fn try_from(points: &[Point]) -> Result<Self, Self::Error> {
        let points: [Point; EYE_POINTS] =
            points.try_into().map_err(|_| DmsError::LandmarkCount {
                expected: EYE_POINTS,
                actual: points.len(),
            })?;
        Ok(Self(points))
    }
}

/// Raw eye landmarks for one detected face.
///
/// Counts are not validated here; use [`FaceLandmarks::eyes`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub left_eye: Vec<Point>,
    pub right_eye: Vec<Point>,
}

impl FaceLandmarks {
    pub fn new(left_eye: Vec<Point>, right_eye: Vec<Point>) -> Self {
        Self { left_eye, right_eye }
    }

    /// Extract both eyes from a full face mesh using a known index layout
    pub fn from_mesh(points: &[Point], scheme: LandmarkScheme) -> Result<Self, DmsError> {
        let pick = |indices: &[usize; EYE_POINTS]| -> Result<Vec<Point>, DmsError> {
            indices
                .iter()
                .map(|&i| {
                    points.get(i).copied().ok_or(DmsError::LandmarkCount {
                        expected: scheme.min_points(),
                        actual: points.len(),
                    })
                })
                .collect()
        };

        Ok(Self {
            left_eye: pick(&scheme.left_eye_indices())?,
            right_eye: pick(&scheme.right_eye_indices())?,
        })
    }

    /// Validated (left, right) eye contours
    pub fn eyes(&self) -> Result<(EyeLandmarks, EyeLandmarks), DmsError> {
        Ok((
            EyeLandmarks::try_from(self.left_eye.as_slice())?,
            EyeLandmarks::try_from(self.right_eye.as_slice())?,
        ))
    }
}

/// Index conventions of common face landmark models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkScheme {
    /// 68-point iBUG layout (dlib shape predictor)
    Dlib68,
    /// 468-point MediaPipe Face Mesh
    MediaPipe468,
}

impl LandmarkScheme {
    pub fn left_eye_indices(&self) -> [usize; EYE_POINTS] {
        match self {
            LandmarkScheme::Dlib68 => [36, 37, 38, 39, 40, 41],
            LandmarkScheme::MediaPipe468 => [362, 385, 387, 263, 373, 380],
        }
    }

    pub fn right_eye_indices(&self) -> [usize; EYE_POINTS] {
        match self {
            LandmarkScheme::Dlib68 => [42, 43, 44, 45, 46, 47],
            LandmarkScheme::MediaPipe468 => [33, 160, 158, 133, 153, 144],
        }
    }

    /// Number of points a full landmark set must contain
    pub fn min_points(&self) -> usize {
        match self {
            LandmarkScheme::Dlib68 => 68,
            LandmarkScheme::MediaPipe468 => 468,
        }
    }
}

/// External face landmark capability.
///
/// Returns `None` when no face is found in the frame.
pub trait LandmarkSource {
    fn landmarks(&self, frame: &RgbImage) -> Option<FaceLandmarks>;
}

impl<F> LandmarkSource for F
where
    F: Fn(&RgbImage) -> Option<FaceLandmarks>,
{
    fn landmarks(&self, frame: &RgbImage) -> Option<FaceLandmarks> {
        self(frame)
    }
}
