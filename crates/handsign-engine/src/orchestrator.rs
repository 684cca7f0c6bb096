//! Per-frame classification across both hands.
//!
//! The orchestrator owns one motion window per hand and the gesture state
//! machine. Each tracked frame appends the wrist position to its hand's
//! window and refreshes that hand's pose/motion reading; the readings of both
//! hands are then scanned in a fixed order and the first wired detection
//! drives the state machine.

use handsign_classify::{MotionClassifier, PoseClassifier};
use handsign_core::{Chirality, GestureKind, HandFrame, MotionWindow, SkeletonSnapshot, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::EngineConfig;
use crate::state_machine::{GestureStateMachine, GestureUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorKind {
    ThumbsUp,
    Fist,
    Wave,
    Shake,
}

impl DetectorKind {
    /// Evaluation order within a frame; each detector is checked left then right.
    pub const ORDER: [DetectorKind; 4] = [
        DetectorKind::ThumbsUp,
        DetectorKind::Fist,
        DetectorKind::Wave,
        DetectorKind::Shake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::ThumbsUp => "thumbs-up",
            DetectorKind::Fist => "fist",
            DetectorKind::Wave => "wave",
            DetectorKind::Shake => "shake",
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which detectors feed the state machine, and as what gesture.
///
/// A detector mapped to `None` (or to [`GestureKind::None`]) is still
/// evaluated and logged but never drives the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiringPolicy {
    pub thumbs_up: Option<GestureKind>,
    pub fist: Option<GestureKind>,
    pub wave: Option<GestureKind>,
    pub shake: Option<GestureKind>,
}

impl Default for WiringPolicy {
    fn default() -> Self {
        Self {
            thumbs_up: Some(GestureKind::ThumbsUp),
            fist: None,
            wave: Some(GestureKind::Wave),
            shake: None,
        }
    }
}

impl WiringPolicy {
    pub fn gesture_for(&self, detector: DetectorKind) -> Option<GestureKind> {
        let wired = match detector {
            DetectorKind::ThumbsUp => self.thumbs_up,
            DetectorKind::Fist => self.fist,
            DetectorKind::Wave => self.wave,
            DetectorKind::Shake => self.shake,
        };
        wired.filter(|kind| !kind.is_none())
    }

    pub fn with(mut self, detector: DetectorKind, gesture: Option<GestureKind>) -> Self {
        match detector {
            DetectorKind::ThumbsUp => self.thumbs_up = gesture,
            DetectorKind::Fist => self.fist = gesture,
            DetectorKind::Wave => self.wave = gesture,
            DetectorKind::Shake => self.shake = gesture,
        }
        self
    }
}

/// One detector firing for one hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub hand: Chirality,
    pub detector: DetectorKind,
}

/// Detector results for one hand, taken at its latest tracked frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HandReading {
    pub thumbs_up: bool,
    pub fist: bool,
    pub wave: bool,
    pub shake: bool,
}

impl HandReading {
    pub fn fired(&self, detector: DetectorKind) -> bool {
        match detector {
            DetectorKind::ThumbsUp => self.thumbs_up,
            DetectorKind::Fist => self.fist,
            DetectorKind::Wave => self.wave,
            DetectorKind::Shake => self.shake,
        }
    }
}

/// Everything the orchestrator decided for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// True detections in evaluation order.
    pub detections: Vec<Detection>,
    /// The detection that drove the state machine, and the gesture it mapped to.
    pub winner: Option<(Detection, GestureKind)>,
    pub update: GestureUpdate,
}

#[derive(Debug, Clone)]
struct HandTrack {
    window: MotionWindow,
    reading: Option<HandReading>,
    /// Set by the first tracked frame; survives loss of tracking.
    seen: bool,
}

impl HandTrack {
    fn new(capacity: usize) -> Self {
        Self {
            window: MotionWindow::with_capacity(capacity),
            reading: None,
            seen: false,
        }
    }
}

pub struct ClassificationOrchestrator {
    pose: PoseClassifier,
    motion: MotionClassifier,
    wiring: WiringPolicy,
    left: HandTrack,
    right: HandTrack,
    state_machine: GestureStateMachine,
}

impl ClassificationOrchestrator {
    pub fn new(config: &EngineConfig) -> Self {
        let pose = PoseClassifier::new(config.pose);
        Self {
            motion: MotionClassifier::new(config.motion, pose.clone()),
            pose,
            wiring: config.wiring,
            left: HandTrack::new(config.window_capacity),
            right: HandTrack::new(config.window_capacity),
            state_machine: GestureStateMachine::new(config.debounce_secs),
        }
    }

    pub fn wiring(&self) -> &WiringPolicy {
        &self.wiring
    }

    pub fn window(&self, hand: Chirality) -> &MotionWindow {
        &self.track(hand).window
    }

    pub fn reading(&self, hand: Chirality) -> Option<HandReading> {
        self.track(hand).reading
    }

    pub fn state_machine(&self) -> &GestureStateMachine {
        &self.state_machine
    }

    /// Active gesture as of `now`.
    pub fn current(&self, now: Timestamp) -> GestureKind {
        self.state_machine.current(now)
    }

    fn track(&self, hand: Chirality) -> &HandTrack {
        match hand {
            Chirality::Left => &self.left,
            Chirality::Right => &self.right,
        }
    }

    fn track_mut(&mut self, hand: Chirality) -> &mut HandTrack {
        match hand {
            Chirality::Left => &mut self.left,
            Chirality::Right => &mut self.right,
        }
    }

    /// Process one frame.
    ///
    /// Returns `None` only while neither hand has ever produced a tracked
    /// frame; after that every frame yields a report, even if the gesture is
    /// unchanged or both hands have since lost tracking.
    pub fn on_frame(&mut self, frame: &HandFrame) -> Option<FrameReport> {
        let hand = frame.chirality();
        let snapshot = &frame.snapshot;

        if snapshot.is_tracked {
            let reading = self.read_hand(hand, snapshot, frame.timestamp);
            let track = self.track_mut(hand);
            track.reading = Some(reading);
            track.seen = true;
        } else if self.track_mut(hand).reading.take().is_some() {
            trace!(hand = %hand, "hand lost tracking");
        }

        if !self.left.seen && !self.right.seen {
            trace!(hand = %hand, "no tracked hand yet, frame skipped");
            return None;
        }

        let detections = self.detections();
        let winner = detections
            .iter()
            .find_map(|d| self.wiring.gesture_for(d.detector).map(|kind| (*d, kind)));

        for detection in &detections {
            if winner.map(|(w, _)| w) != Some(*detection) {
                debug!(
                    hand = %detection.hand,
                    detector = %detection.detector,
                    "detection not driving state"
                );
            }
        }

        let observed = winner.map(|(_, kind)| kind).unwrap_or_default();
        let transition = self.state_machine.observe(observed, frame.timestamp);
        if let Some(transition) = transition {
            info!(?transition, t = frame.timestamp.as_secs_f64(), "gesture transition");
        }

        Some(FrameReport {
            detections,
            winner,
            update: GestureUpdate {
                timestamp: frame.timestamp,
                gesture: self.state_machine.current(frame.timestamp),
                transition,
            },
        })
    }

    /// Apply expiry without a frame. Yields an update only when the active
    /// gesture clears.
    pub fn poll(&mut self, now: Timestamp) -> Option<GestureUpdate> {
        let transition = self.state_machine.expire(now)?;
        info!(?transition, t = now.as_secs_f64(), "gesture expired");
        Some(GestureUpdate {
            timestamp: now,
            gesture: GestureKind::None,
            transition: Some(transition),
        })
    }

    pub fn reset(&mut self) {
        for track in [&mut self.left, &mut self.right] {
            track.window.clear();
            track.reading = None;
            track.seen = false;
        }
        self.state_machine.reset();
    }

    fn read_hand(&mut self, hand: Chirality, snapshot: &SkeletonSnapshot, now: Timestamp) -> HandReading {
        let track = match hand {
            Chirality::Left => &mut self.left,
            Chirality::Right => &mut self.right,
        };
        track.window.append(snapshot.wrist_position(), now);

        HandReading {
            thumbs_up: self.pose.is_thumbs_up(snapshot),
            fist: self.pose.is_fist(snapshot),
            wave: self.motion.is_waving(&track.window, snapshot),
            shake: self.motion.is_shaking(&track.window),
        }
    }

    fn detections(&self) -> Vec<Detection> {
        DetectorKind::ORDER
            .iter()
            .flat_map(|&detector| {
                [Chirality::Left, Chirality::Right]
                    .into_iter()
                    .map(move |hand| Detection { hand, detector })
            })
            .filter(|d| self.track(d.hand).reading.is_some_and(|r| r.fired(d.detector)))
            .collect()
    }
}

impl Default for ClassificationOrchestrator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{GestureState, GestureTransition};
    use handsign_core::{HandJoint, Position3D};

    fn hand(chirality: Chirality, tips: [f32; 5], wrist: Position3D) -> SkeletonSnapshot {
        HandJoint::fingertips()
            .into_iter()
            .zip(tips)
            .fold(
                SkeletonSnapshot::new(chirality)
                    .with_joint(HandJoint::Wrist, Position3D::origin())
                    .with_origin(wrist),
                |s, (tip, d)| s.with_joint(tip, Position3D::new(0.0, d, 0.0)),
            )
    }

    fn open(chirality: Chirality, x: f32) -> SkeletonSnapshot {
        hand(chirality, [0.2; 5], Position3D::new(x, 0.0, 0.0))
    }

    fn thumbs_up(chirality: Chirality) -> SkeletonSnapshot {
        hand(chirality, [0.12, 0.04, 0.04, 0.04, 0.04], Position3D::origin())
    }

    fn fist(chirality: Chirality, x: f32) -> SkeletonSnapshot {
        hand(chirality, [0.04; 5], Position3D::new(x, 0.0, 0.0))
    }

    fn frame(t: f64, snapshot: SkeletonSnapshot) -> HandFrame {
        HandFrame::new(Timestamp::from_secs(t), snapshot)
    }

    /// Right-hand x positions giving alternating speeds 1.0 / 0.01 m/s at 10 Hz.
    const JITTER: [f32; 6] = [0.0, 0.1, 0.101, 0.201, 0.202, 0.302];

    #[test]
    fn test_skips_until_a_hand_is_tracked() {
        let mut orchestrator = ClassificationOrchestrator::default();
        let lost = frame(0.0, open(Chirality::Left, 0.0).untracked());

        assert!(orchestrator.on_frame(&lost).is_none());
        assert!(orchestrator.window(Chirality::Left).is_empty());
        assert_eq!(orchestrator.state_machine().state(), GestureState::Idle);
    }

    #[test]
    fn test_untracked_frame_does_not_append() {
        let mut orchestrator = ClassificationOrchestrator::default();
        orchestrator.on_frame(&frame(0.0, open(Chirality::Right, 0.0)));
        orchestrator.on_frame(&frame(0.0, open(Chirality::Left, 0.0)));
        let report = orchestrator.on_frame(&frame(0.1, open(Chirality::Right, 5.0).untracked()));

        assert!(report.is_some());
        assert_eq!(orchestrator.window(Chirality::Right).count(), 1);
        assert!(orchestrator.reading(Chirality::Right).is_none());
        assert!(orchestrator.reading(Chirality::Left).is_some());
    }

    #[test]
    fn test_emits_every_frame() {
        let mut orchestrator = ClassificationOrchestrator::default();
        for i in 0..5 {
            let report = orchestrator
                .on_frame(&frame(i as f64 * 0.1, open(Chirality::Left, 0.0)))
                .unwrap();
            assert_eq!(report.update.gesture, GestureKind::None);
            assert!(report.update.transition.is_none());
        }
    }

    #[test]
    fn test_thumbs_up_drives_state() {
        let mut orchestrator = ClassificationOrchestrator::default();
        let report = orchestrator.on_frame(&frame(1.0, thumbs_up(Chirality::Right))).unwrap();

        assert_eq!(report.update.gesture, GestureKind::ThumbsUp);
        assert_eq!(
            report.winner,
            Some((
                Detection {
                    hand: Chirality::Right,
                    detector: DetectorKind::ThumbsUp,
                },
                GestureKind::ThumbsUp
            ))
        );
        // A thumbs-up hand also satisfies the fist radius.
        assert!(report.detections.iter().any(|d| d.detector == DetectorKind::Fist));
    }

    #[test]
    fn test_wave_from_jittery_open_hand() {
        let mut orchestrator = ClassificationOrchestrator::default();
        let mut reports = Vec::new();
        for (i, x) in JITTER.iter().enumerate() {
            reports.push(
                orchestrator
                    .on_frame(&frame(i as f64 * 0.1, open(Chirality::Right, *x)))
                    .unwrap(),
            );
        }

        assert!(reports[..5].iter().all(|r| r.update.gesture == GestureKind::None));
        let last = reports.last().unwrap();
        assert_eq!(last.update.gesture, GestureKind::Wave);
        assert_eq!(
            last.detections,
            vec![
                Detection {
                    hand: Chirality::Right,
                    detector: DetectorKind::Wave,
                },
                Detection {
                    hand: Chirality::Right,
                    detector: DetectorKind::Shake,
                },
            ]
        );
    }

    #[test]
    fn test_shaking_fist_is_not_a_wave() {
        let mut orchestrator = ClassificationOrchestrator::default();
        let mut last = None;
        for (i, x) in JITTER.iter().enumerate() {
            last = orchestrator.on_frame(&frame(i as f64 * 0.1, fist(Chirality::Right, *x)));
        }

        let report = last.unwrap();
        assert_eq!(report.update.gesture, GestureKind::None);
        assert!(report.winner.is_none());
        let fired: Vec<DetectorKind> = report.detections.iter().map(|d| d.detector).collect();
        assert_eq!(fired, vec![DetectorKind::Fist, DetectorKind::Shake]);
    }

    #[test]
    fn test_thumbs_up_outranks_wave() {
        let mut orchestrator = ClassificationOrchestrator::default();
        for (i, x) in JITTER.iter().enumerate() {
            orchestrator.on_frame(&frame(i as f64 * 0.1, open(Chirality::Right, *x)));
        }
        let report = orchestrator.on_frame(&frame(0.55, thumbs_up(Chirality::Left))).unwrap();

        assert_eq!(report.update.gesture, GestureKind::ThumbsUp);
        assert_eq!(report.winner.map(|(d, _)| d.hand), Some(Chirality::Left));
    }

    #[test]
    fn test_custom_wiring_promotes_fist() {
        let config = EngineConfig {
            wiring: WiringPolicy::default().with(DetectorKind::Fist, Some(GestureKind::ThumbsDown)),
            ..Default::default()
        };
        let mut orchestrator = ClassificationOrchestrator::new(&config);
        let report = orchestrator.on_frame(&frame(0.0, fist(Chirality::Left, 0.0))).unwrap();
        assert_eq!(report.update.gesture, GestureKind::ThumbsDown);
    }

    #[test]
    fn test_none_wiring_is_unwired() {
        let wiring = WiringPolicy::default().with(DetectorKind::Wave, Some(GestureKind::None));
        assert_eq!(wiring.gesture_for(DetectorKind::Wave), None);
        assert_eq!(wiring.gesture_for(DetectorKind::ThumbsUp), Some(GestureKind::ThumbsUp));
    }

    #[test]
    fn test_gesture_expires_on_later_frame() {
        let mut orchestrator = ClassificationOrchestrator::default();
        orchestrator.on_frame(&frame(0.0, thumbs_up(Chirality::Right)));

        let held = orchestrator.on_frame(&frame(1.0, open(Chirality::Right, 0.0))).unwrap();
        assert_eq!(held.update.gesture, GestureKind::ThumbsUp);

        let cleared = orchestrator.on_frame(&frame(2.0, open(Chirality::Right, 0.0))).unwrap();
        assert_eq!(cleared.update.gesture, GestureKind::None);
        assert!(cleared.update.transition.is_some());
    }

    #[test]
    fn test_poll_reports_only_expiry() {
        let mut orchestrator = ClassificationOrchestrator::default();
        orchestrator.on_frame(&frame(0.0, thumbs_up(Chirality::Right)));

        assert!(orchestrator.poll(Timestamp::from_secs(1.9)).is_none());
        let update = orchestrator.poll(Timestamp::from_secs(2.0)).unwrap();
        assert_eq!(update.gesture, GestureKind::None);
        assert!(orchestrator.poll(Timestamp::from_secs(3.0)).is_none());
    }

    #[test]
    fn test_lost_tracking_still_reports_and_clears() {
        let mut orchestrator = ClassificationOrchestrator::default();
        orchestrator.on_frame(&frame(0.0, thumbs_up(Chirality::Right)));

        let held = orchestrator
            .on_frame(&frame(1.0, thumbs_up(Chirality::Right).untracked()))
            .unwrap();
        assert_eq!(held.update.gesture, GestureKind::ThumbsUp);
        assert!(held.detections.is_empty());

        let cleared = orchestrator
            .on_frame(&frame(2.5, thumbs_up(Chirality::Right).untracked()))
            .unwrap();
        assert_eq!(cleared.update.gesture, GestureKind::None);
        assert_eq!(
            cleared.update.transition,
            Some(GestureTransition::Cleared {
                gesture: GestureKind::ThumbsUp
            })
        );
        assert_eq!(orchestrator.state_machine().state(), GestureState::Idle);

        let idle = orchestrator
            .on_frame(&frame(3.0, open(Chirality::Left, 0.0).untracked()))
            .unwrap();
        assert_eq!(idle.update.gesture, GestureKind::None);
        assert!(idle.update.transition.is_none());
    }

    #[test]
    fn test_reset() {
        let mut orchestrator = ClassificationOrchestrator::default();
        orchestrator.on_frame(&frame(0.0, thumbs_up(Chirality::Right)));
        orchestrator.reset();

        assert!(orchestrator.window(Chirality::Right).is_empty());
        assert!(orchestrator.reading(Chirality::Right).is_none());
        assert_eq!(orchestrator.current(Timestamp::from_secs(0.5)), GestureKind::None);
    }
}
