//! Drowsiness monitor
//!
//! Owns one closure timer per active session. Frames for the same session
//! are serialized on that session's mutex; different sessions never
//! contend beyond the short map lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use image::RgbImage;
use metrics::{counter, gauge};
use tracing::{debug, info, warn};

use crate::analysis::FrameAnalysis;
use crate::closure::ClosureTimer;
use crate::config::DmsConfig;
use crate::landmarks::{FaceLandmarks, LandmarkSource};
use crate::ratio::{face_ratio, EyeMeasurement};
use crate::session::SessionSummary;
use crate::store::{SessionId, SessionStore, StoreError};
use crate::DmsError;

/// What a frame yielded for the closure decision
enum Measurement {
    NoFace,
    /// Face found but no usable ratio (partial landmarks, zero-width eye)
    Unmeasured,
    Eyes(EyeMeasurement),
    Ratio(f32),
}

impl Measurement {
    fn from_landmarks(landmarks: Option<&FaceLandmarks>) -> Self {
        let Some(face) = landmarks else {
            return Measurement::NoFace;
        };

        match face.eyes().and_then(|(left, right)| face_ratio(&left, &right)) {
            Ok(eyes) => Measurement::Eyes(eyes),
            Err(e) => {
                warn!("Frame excluded from closure decision: {}", e);
                Measurement::Unmeasured
            }
        }
    }

    fn from_ratio(ratio: Option<f32>) -> Self {
        match ratio {
            None => Measurement::NoFace,
            Some(r) if r.is_finite() && r >= 0.0 => Measurement::Ratio(r),
            Some(r) => {
                warn!("Frame excluded from closure decision: invalid ratio {}", r);
                Measurement::Unmeasured
            }
        }
    }
}

/// Per-session drowsiness tracking on top of a [`SessionStore`]
pub struct DrowsinessMonitor {
    config: DmsConfig,
    store: Arc<dyn SessionStore>,
    timers: RwLock<HashMap<SessionId, Arc<Mutex<ClosureTimer>>>>,
    started: Instant,
}

impl DrowsinessMonitor {
    /// Create a monitor; the configuration is validated and fixed for its lifetime
    pub fn new(config: DmsConfig, store: Arc<dyn SessionStore>) -> Result<Self, DmsError> {
        config.validate()?;
        info!(
            ear_threshold = config.ear_threshold,
            min_closed_ms = config.min_closed_duration_ms,
            "Creating drowsiness monitor"
        );
        Ok(Self {
            config,
            store,
            timers: RwLock::new(HashMap::new()),
            started: Instant::now(),
        })
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    /// Time since the monitor was created, for callers without a capture clock
    pub fn now(&self) -> Duration {
        self.started.elapsed()
    }

    /// Open a session and its closure timer
    pub fn start_session(&self, owner: &str) -> Result<SessionId, DmsError> {
        let mut timers = self.timers.write().map_err(|e| DmsError::Lock(e.to_string()))?;
        let id = self.store.create_session(owner)?;
        timers.insert(id, Arc::new(Mutex::new(ClosureTimer::from_config(&self.config))));
        gauge!("dms_active_sessions").set(timers.len() as f64);

        info!(session = %id, owner, "Session started");
        Ok(id)
    }

    /// Reset the session's closure timer to open without touching its counters
    pub fn restart_session(&self, id: SessionId) -> Result<(), DmsError> {
        let timer = self.timer(id)?;
        timer.lock().map_err(|e| DmsError::Lock(e.to_string()))?.reset();
        info!(session = %id, "Session timer reset");
        Ok(())
    }

    /// Close a session and return its final summary
    pub fn end_session(&self, id: SessionId) -> Result<SessionSummary, DmsError> {
        let timer = self.timer(id)?;

        // Wait out any frame still being recorded
        let _guard = timer.lock().map_err(|e| DmsError::Lock(e.to_string()))?;

        // The timer stays registered until the store has closed the session,
        // so a failed close can be retried
        let counters = self.store.end_session(id).map_err(|e| session_error(id, e))?;
        {
            let mut timers = self.timers.write().map_err(|e| DmsError::Lock(e.to_string()))?;
            timers.remove(&id);
            gauge!("dms_active_sessions").set(timers.len() as f64);
        }

        let summary = counters.summary(id);
        info!(
            session = %id,
            total_checks = summary.total_checks,
            drowsy_events = summary.drowsy_events,
            safety_score = summary.safety_score,
            "Session ended"
        );
        Ok(summary)
    }

    /// Current counters and score; also works for ended sessions
    pub fn summary(&self, id: SessionId) -> Result<SessionSummary, DmsError> {
        let counters = self.store.read_counters(id)?;
        Ok(counters.summary(id))
    }

    pub fn is_active(&self, id: SessionId) -> bool {
        self.timers
            .read()
            .map(|t| t.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn active_sessions(&self) -> usize {
        self.timers.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Analyze a decoded frame through an external landmark source
    pub fn analyze_frame<L: LandmarkSource + ?Sized>(
        &self,
        id: SessionId,
        frame: &RgbImage,
        source: &L,
        now: Duration,
    ) -> Result<FrameAnalysis, DmsError> {
        // Reject before paying for landmark extraction
        let timer = self.timer(id)?;
        let landmarks = source.landmarks(frame);
        self.process(id, &timer, Measurement::from_landmarks(landmarks.as_ref()), now)
    }

    /// Analyze landmarks for one frame; `None` means no face was found
    pub fn analyze_landmarks(
        &self,
        id: SessionId,
        landmarks: Option<&FaceLandmarks>,
        now: Duration,
    ) -> Result<FrameAnalysis, DmsError> {
        let timer = self.timer(id)?;
        self.process(id, &timer, Measurement::from_landmarks(landmarks), now)
    }

    /// Analyze an already computed openness ratio; `None` means no face was found
    pub fn analyze_ratio(
        &self,
        id: SessionId,
        ratio: Option<f32>,
        now: Duration,
    ) -> Result<FrameAnalysis, DmsError> {
        let timer = self.timer(id)?;
        self.process(id, &timer, Measurement::from_ratio(ratio), now)
    }

    fn timer(&self, id: SessionId) -> Result<Arc<Mutex<ClosureTimer>>, DmsError> {
        let timers = self.timers.read().map_err(|e| DmsError::Lock(e.to_string()))?;
        timers.get(&id).cloned().ok_or(DmsError::NoActiveSession(id))
    }

    fn process(
        &self,
        id: SessionId,
        timer: &Mutex<ClosureTimer>,
        measurement: Measurement,
        now: Duration,
    ) -> Result<FrameAnalysis, DmsError> {
        let mut timer = timer.lock().map_err(|e| DmsError::Lock(e.to_string()))?;
        let previous = timer.clone();

        let (status, face_detected, eyes, ratio) = match measurement {
            Measurement::NoFace => (timer.no_face(), false, None, None),
            Measurement::Unmeasured => {
                counter!("dms_unmeasured_frames_total").increment(1);
                (timer.no_face(), true, None, None)
            }
            Measurement::Eyes(eyes) => (timer.update(eyes.ratio, now), true, Some(eyes), Some(eyes.ratio)),
            Measurement::Ratio(r) => (timer.update(r, now), true, None, Some(r)),
        };

        // Keep timer and counters in step so a failed frame can be resubmitted
        if let Err(e) = self.store.increment_counters(id, status.is_drowsy()) {
            *timer = previous;
            return Err(session_error(id, e));
        }

        counter!("dms_frames_analyzed_total").increment(1);
        if status.is_drowsy() {
            counter!("dms_drowsy_frames_total").increment(1);
        }

        let mut analysis = FrameAnalysis::new(id, status, timer.phase());
        analysis.face_detected = face_detected;
        analysis.measured = ratio.is_some();
        analysis.ratio = ratio;
        if let Some(eyes) = &eyes {
            analysis = analysis.with_eyes(eyes);
        }

        debug!(session = %id, ?status, phase = ?analysis.phase, ratio = ?ratio, "Frame analyzed");
        Ok(analysis)
    }
}

/// A store that no longer knows the session means the session is not active
fn session_error(id: SessionId, err: StoreError) -> DmsError {
    match err {
        StoreError::UnknownSession(_) | StoreError::SessionEnded(_) => DmsError::NoActiveSession(id),
        other => DmsError::Store(other),
    }
}
