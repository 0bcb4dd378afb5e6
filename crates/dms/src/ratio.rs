//! Eye openness ratio (EAR)

use serde::{Deserialize, Serialize};

use crate::landmarks::EyeLandmarks;
use crate::DmsError;

/// Openness ratio of a single eye.
///
/// `(|p2-p6| + |p3-p5|) / (2 * |p1-p4|)`. Lower means more closed.
pub fn eye_ratio(eye: &EyeLandmarks) -> Result<f32, DmsError> {
    let [p1, p2, p3, p4, p5, p6] = eye.points();

    let vertical1 = p2.distance(p6);
    let vertical2 = p3.distance(p5);
    let horizontal = p1.distance(p4);

    if horizontal == 0.0 || !horizontal.is_finite() {
        return Err(DmsError::DegenerateGeometry);
    }

    let ratio = (vertical1 + vertical2) / (2.0 * horizontal);
    if !ratio.is_finite() {
        return Err(DmsError::DegenerateGeometry);
    }
    Ok(ratio)
}

/// Per-eye and averaged openness for one face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeMeasurement {
    pub left: f32,
    pub right: f32,
    /// Mean of both eyes
    pub ratio: f32,
}

/// Measure both eyes; the face ratio is their arithmetic mean
pub fn face_ratio(left: &EyeLandmarks, right: &EyeLandmarks) -> Result<EyeMeasurement, DmsError> {
    let left = eye_ratio(left)?;
    let right = eye_ratio(right)?;
    Ok(EyeMeasurement {
        left,
        right,
        ratio: (left + right) / 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Point;

    /// Eye 4px wide with lids `gap` apart
    fn eye(gap: f32) -> EyeLandmarks {
        let h = gap / 2.0;
        EyeLandmarks([
            Point::new(0.0, 0.0),
            Point::new(1.0, -h),
            Point::new(3.0, -h),
            Point::new(4.0, 0.0),
            Point::new(3.0, h),
            Point::new(1.0, h),
        ])
    }

    #[test]
    fn test_open_eye_ratio() {
        // (1.2 + 1.2) / (2 * 4)
        let r = eye_ratio(&eye(1.2)).unwrap();
        assert!((r - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_closed_eye_ratio_is_zero() {
        assert_eq!(eye_ratio(&eye(0.0)).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_width_is_degenerate() {
        let p = Point::new(5.0, 5.0);
        let eye = EyeLandmarks([p, Point::new(5.0, 4.0), p, p, p, Point::new(5.0, 6.0)]);
        assert!(matches!(eye_ratio(&eye), Err(DmsError::DegenerateGeometry)));
    }

    #[test]
    fn test_non_finite_points_are_degenerate() {
        let nan = EyeLandmarks([Point::new(f32::NAN, 0.0); 6]);
        assert!(matches!(eye_ratio(&nan), Err(DmsError::DegenerateGeometry)));

        let mut lid = eye(1.2);
        lid.0[1] = Point::new(1.0, f32::INFINITY);
        assert!(matches!(eye_ratio(&lid), Err(DmsError::DegenerateGeometry)));

        let mut corner = eye(1.2);
        corner.0[3] = Point::new(f32::NEG_INFINITY, 0.0);
        assert!(matches!(eye_ratio(&corner), Err(DmsError::DegenerateGeometry)));

        assert!(face_ratio(&eye(1.2), &nan).is_err());
    }

    #[test]
    fn test_face_ratio_is_mean() {
        let m = face_ratio(&eye(1.2), &eye(0.4)).unwrap();
        assert!((m.left - 0.3).abs() < 1e-6);
        assert!((m.right - 0.1).abs() < 1e-6);
        assert!((m.ratio - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_scale_invariant() {
        let scaled = EyeLandmarks(eye(1.2).0.map(|p| Point::new(p.x * 10.0, p.y * 10.0)));
        let a = eye_ratio(&eye(1.2)).unwrap();
        let b = eye_ratio(&scaled).unwrap();
        assert!((a - b).abs() < 1e-6);
    }
}
