//! End-to-end monitor behaviour against the in-memory repository

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dms::{
    ClosurePhase, DmsConfig, DmsError, DrowsinessMonitor, FaceLandmarks, FrameStatus, Point,
};
use storage::Repository;

fn at(secs: f64) -> Duration {
    Duration::from_secs_f64(secs)
}

/// Face whose eyes both have openness `ratio` (eye width 10px)
fn face(ratio: f32) -> FaceLandmarks {
    let half = ratio * 10.0 / 2.0;
    let eye = |x0: f32| {
        vec![
            Point::new(x0, 0.0),
            Point::new(x0 + 3.0, -half),
            Point::new(x0 + 7.0, -half),
            Point::new(x0 + 10.0, 0.0),
            Point::new(x0 + 7.0, half),
            Point::new(x0 + 3.0, half),
        ]
    };
    FaceLandmarks::new(eye(0.0), eye(30.0))
}

fn monitor() -> (DrowsinessMonitor, Arc<Repository>) {
    let repo = Arc::new(Repository::new());
    let monitor = DrowsinessMonitor::new(DmsConfig::default(), repo.clone()).unwrap();
    (monitor, repo)
}

#[test]
fn reference_sequence_from_landmarks() {
    let (monitor, _) = monitor();
    let id = monitor.start_session("driver").unwrap();

    let statuses: Vec<_> = [(0.30, 0.0), (0.10, 0.1), (0.10, 0.9), (0.10, 1.2)]
        .iter()
        .map(|&(ratio, t)| {
            monitor
                .analyze_landmarks(id, Some(&face(ratio)), at(t))
                .unwrap()
                .status
        })
        .collect();

    assert_eq!(
        statuses,
        [
            FrameStatus::Safe,
            FrameStatus::Safe,
            FrameStatus::Safe,
            FrameStatus::Drowsy
        ]
    );

    let summary = monitor.summary(id).unwrap();
    assert_eq!(summary.total_checks, 4);
    assert_eq!(summary.drowsy_events, 1);
    assert_eq!(summary.safety_score, 75.0);
}

#[test]
fn landmark_ratios_are_reported() {
    let (monitor, _) = monitor();
    let id = monitor.start_session("driver").unwrap();

    let analysis = monitor.analyze_landmarks(id, Some(&face(0.3)), at(0.0)).unwrap();
    assert!(analysis.face_detected);
    assert!(analysis.measured);
    assert!((analysis.ratio.unwrap() - 0.3).abs() < 1e-5);
    assert!((analysis.left_ratio.unwrap() - 0.3).abs() < 1e-5);
    assert!((analysis.right_ratio.unwrap() - 0.3).abs() < 1e-5);
}

#[test]
fn lost_face_restarts_closure() {
    let (monitor, _) = monitor();
    let id = monitor.start_session("driver").unwrap();

    monitor.analyze_landmarks(id, Some(&face(0.1)), at(0.0)).unwrap();
    monitor.analyze_landmarks(id, Some(&face(0.1)), at(0.9)).unwrap();

    let lost = monitor.analyze_landmarks(id, None, at(1.0)).unwrap();
    assert_eq!(lost.status, FrameStatus::Safe);
    assert_eq!(lost.phase, ClosurePhase::Open);
    assert!(!lost.face_detected);

    // Would be 1.1s of closure without the reset
    let back = monitor.analyze_landmarks(id, Some(&face(0.1)), at(1.1)).unwrap();
    assert_eq!(back.status, FrameStatus::Safe);
    assert_eq!(back.phase, ClosurePhase::Closing);

    let later = monitor.analyze_landmarks(id, Some(&face(0.1)), at(2.2)).unwrap();
    assert_eq!(later.status, FrameStatus::Drowsy);
}

#[test]
fn degenerate_eye_is_not_a_crash() {
    let (monitor, _) = monitor();
    let id = monitor.start_session("driver").unwrap();

    monitor.analyze_landmarks(id, Some(&face(0.1)), at(0.0)).unwrap();
    let flat = FaceLandmarks::new(vec![Point::new(1.0, 1.0); 6], vec![Point::new(1.0, 1.0); 6]);
    let analysis = monitor.analyze_landmarks(id, Some(&flat), at(1.5)).unwrap();

    assert_eq!(analysis.status, FrameStatus::Safe);
    assert_eq!(analysis.phase, ClosurePhase::Open);
    assert!(!analysis.measured);
}

#[test]
fn sessions_are_isolated() {
    let (monitor, _) = monitor();
    let a = monitor.start_session("alice").unwrap();
    let b = monitor.start_session("bob").unwrap();

    monitor.analyze_ratio(a, Some(0.1), at(0.0)).unwrap();
    monitor.analyze_ratio(b, Some(0.3), at(0.5)).unwrap();

    // Bob's open eyes must not reset Alice's closure
    let alice = monitor.analyze_ratio(a, Some(0.1), at(1.5)).unwrap();
    assert_eq!(alice.status, FrameStatus::Drowsy);

    let bob = monitor.analyze_ratio(b, Some(0.1), at(1.5)).unwrap();
    assert_eq!(bob.status, FrameStatus::Safe);

    assert_eq!(monitor.summary(a).unwrap().drowsy_events, 1);
    assert_eq!(monitor.summary(b).unwrap().drowsy_events, 0);
}

#[test]
fn ended_session_rejects_frames_but_keeps_summary() {
    let (monitor, repo) = monitor();
    let id = monitor.start_session("driver").unwrap();
    monitor.analyze_ratio(id, Some(0.3), at(0.0)).unwrap();

    let summary = monitor.end_session(id).unwrap();
    assert_eq!(summary.total_checks, 1);
    assert_eq!(repo.active_count(), 0);

    assert!(matches!(
        monitor.analyze_ratio(id, Some(0.3), at(0.1)),
        Err(DmsError::NoActiveSession(_))
    ));
    assert_eq!(monitor.summary(id).unwrap(), summary);
}

#[test]
fn concurrent_frames_are_all_counted() {
    let (monitor, _) = monitor();
    let monitor = Arc::new(monitor);
    let ids: Vec<_> = (0..4)
        .map(|i| monitor.start_session(&format!("driver-{}", i)).unwrap())
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let monitor = monitor.clone();
            let ids = ids.clone();
            thread::spawn(move || {
                for frame in 0..250u64 {
                    let id = ids[worker % ids.len()];
                    let ratio = if frame % 3 == 0 { 0.3 } else { 0.1 };
                    monitor
                        .analyze_ratio(id, Some(ratio), Duration::from_millis(frame * 10))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for id in ids {
        let summary = monitor.summary(id).unwrap();
        assert_eq!(summary.total_checks, 500);
        assert!(summary.drowsy_events <= summary.total_checks);
    }
}
