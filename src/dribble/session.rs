//! Drill session gating around the dribble counter.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use super::counter::DribbleCounter;
use super::motion::{DribbleConfig, DribbleEvent};
use crate::tracker::ChosenDetection;

/// Which coordinate of the ball center feeds the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Sensor x, the world vertical when the camera is locked in landscape.
    #[default]
    X,
    Y,
}

impl Axis {
    #[inline]
    pub fn coordinate(self, center: &Point2<f32>) -> f32 {
        match self {
            Axis::X => center.x,
            Axis::Y => center.y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Tracked detections below this confidence are not counted.
    pub min_confidence: f32,
    pub axis: Axis,
    /// Drill length; `None` runs until ended.
    pub drill_duration_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            axis: Axis::X,
            drill_duration_ms: Some(60_000),
        }
    }
}

/// One timed drill.
///
/// Positions are only counted while the session is active. After the drill
/// duration elapses the session stays active, so the final count remains
/// visible, but further positions are ignored until [`end`](Self::end).
#[derive(Debug, Clone, Default)]
pub struct DrillSession {
    config: SessionConfig,
    counter: DribbleCounter,
    started_at: Option<u64>,
    deadline: Option<u64>,
}

impl DrillSession {
    pub fn new(config: SessionConfig, dribble: DribbleConfig) -> Self {
        Self {
            config,
            counter: DribbleCounter::new(dribble),
            started_at: None,
            deadline: None,
        }
    }

    /// Start a fresh drill at `now_ms`, discarding any previous state.
    pub fn start(&mut self, now_ms: u64) {
        self.counter.reset();
        self.started_at = Some(now_ms);
        self.deadline = self
            .config
            .drill_duration_ms
            .map(|duration| now_ms.saturating_add(duration));
        info!(now_ms, deadline = self.deadline, "drill session started");
    }

    /// Stop accepting positions and reset the counter.
    pub fn end(&mut self) {
        if self.started_at.is_some() {
            info!(count = self.counter.count(), "drill session ended");
        }
        self.started_at = None;
        self.deadline = None;
        self.counter.reset();
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn count(&self) -> u64 {
        self.counter.count()
    }

    pub fn counter(&self) -> &DribbleCounter {
        &self.counter
    }

    /// Milliseconds left in the drill, `None` if inactive or untimed.
    pub fn time_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.started_at?;
        self.deadline.map(|deadline| deadline.saturating_sub(now_ms))
    }

    /// Feed one coordinate captured at `timestamp_ms`.
    pub fn report_position(&mut self, coordinate: f32, timestamp_ms: u64) -> Option<DribbleEvent> {
        let started_at = self.started_at?;
        if timestamp_ms < started_at {
            trace!(timestamp_ms, started_at, "discarding position from before session start");
            return None;
        }
        if self.deadline.is_some_and(|deadline| timestamp_ms > deadline) {
            trace!(timestamp_ms, "discarding position after drill deadline");
            return None;
        }
        if !coordinate.is_finite() {
            return None;
        }
        self.counter.update(coordinate, timestamp_ms)
    }

    /// Feed the tracker's choice for a frame.
    ///
    /// Only confident, freshly tracked detections move the counter.
    pub fn report_detection(
        &mut self,
        chosen: &ChosenDetection,
        timestamp_ms: u64,
    ) -> Option<DribbleEvent> {
        match chosen {
            ChosenDetection::Tracked {
                center, confidence, ..
            } if *confidence >= self.config.min_confidence => {
                let coordinate = self.config.axis.coordinate(center);
                self.report_position(coordinate, timestamp_ms)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dribble::DribbleMotion;
    use crate::tracker::Rect;

    fn bounce(session: &mut DrillSession, start_ms: u64) {
        for (i, pos) in [0.5, 0.3, 0.5].into_iter().enumerate() {
            session.report_position(pos, start_ms + i as u64 * 50);
        }
    }

    #[test]
    fn test_inactive_session_ignores_positions() {
        let mut session = DrillSession::default();
        bounce(&mut session, 0);
        assert_eq!(session.count(), 0);
        assert!(!session.is_active());
    }

    #[test]
    fn test_counts_while_active_and_resets_on_end() {
        let mut session = DrillSession::default();
        session.start(1_000);
        bounce(&mut session, 1_000);
        assert_eq!(session.count(), 1);

        session.end();
        assert_eq!(session.count(), 0);
        bounce(&mut session, 2_000);
        assert_eq!(session.count(), 0);

        session.end();
        assert!(!session.is_active());
        assert_eq!(*session.counter().motion(), DribbleMotion::default());
    }

    #[test]
    fn test_stale_and_late_positions_are_dropped() {
        let mut session = DrillSession::new(
            SessionConfig {
                drill_duration_ms: Some(1_000),
                ..SessionConfig::default()
            },
            DribbleConfig::default(),
        );
        session.start(10_000);
        bounce(&mut session, 9_000);
        assert_eq!(session.count(), 0);
        assert!(session.counter().motion().last_pos.is_none());

        bounce(&mut session, 11_100);
        assert_eq!(session.count(), 0);

        assert_eq!(session.time_remaining_ms(10_400), Some(600));
        assert_eq!(session.time_remaining_ms(12_000), Some(0));
    }

    #[test]
    fn test_report_detection_gates_on_confidence() {
        let mut session = DrillSession::default();
        session.start(0);
        let tracked = |x: f32, confidence: f32| ChosenDetection::Tracked {
            center: Point2::new(x, 0.5),
            confidence,
            bbox: Rect::from_xywh(x, 0.5, 0.1, 0.1),
        };

        for (i, x) in [0.5, 0.3, 0.5].into_iter().enumerate() {
            session.report_detection(&tracked(x, 0.5), i as u64 * 50);
        }
        assert_eq!(session.count(), 0);

        let last_known = ChosenDetection::LastKnown {
            center: Point2::new(0.1, 0.5),
            frames_since_seen: 1,
        };
        assert!(session.report_detection(&last_known, 10).is_none());

        for (i, x) in [0.5, 0.3, 0.5].into_iter().enumerate() {
            session.report_detection(&tracked(x, 0.9), 200 + i as u64 * 50);
        }
        assert_eq!(session.count(), 1);
    }

    #[test]
    fn test_axis_y() {
        let mut session = DrillSession::new(
            SessionConfig {
                axis: Axis::Y,
                ..SessionConfig::default()
            },
            DribbleConfig::default(),
        );
        session.start(0);
        for (i, y) in [0.5, 0.3, 0.5].into_iter().enumerate() {
            let chosen = ChosenDetection::Tracked {
                center: Point2::new(0.5, y),
                confidence: 0.9,
                bbox: Rect::from_xywh(0.5, y, 0.1, 0.1),
            };
            session.report_detection(&chosen, i as u64 * 50);
        }
        assert_eq!(session.count(), 1);
    }
}
