//! Single-ball tracking with gap tolerance.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::tracker::history::{HistoryEntry, TrackHistory};
use crate::tracker::matching::{self, Detection, ScoreWeights};
use crate::tracker::track_state::ChosenDetection;

/// Configuration for the BallTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Farthest a candidate may be from the last position to count as the same ball.
    pub max_match_distance: f32,
    /// Frames without a detection before the track is dropped.
    pub max_gap_frames: u32,
    /// Number of accepted detections kept for trajectory scoring.
    pub history_size: usize,
    pub confidence_weight: f32,
    pub proximity_weight: f32,
    pub proximity_falloff: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_match_distance: 0.20,
            max_gap_frames: 30,
            history_size: 5,
            confidence_weight: 0.7,
            proximity_weight: 0.3,
            proximity_falloff: 5.0,
        }
    }
}

impl TrackerConfig {
    fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            confidence: self.confidence_weight,
            proximity: self.proximity_weight,
            falloff: self.proximity_falloff,
        }
    }
}

/// Everything the tracker remembers between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    last_position: Option<Point2<f32>>,
    frames_since_detection: u32,
    history: TrackHistory,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new(TrackerConfig::default().history_size)
    }
}

impl TrackerState {
    pub fn new(history_size: usize) -> Self {
        Self {
            last_position: None,
            frames_since_detection: 0,
            history: TrackHistory::new(history_size),
        }
    }

    pub fn last_position(&self) -> Option<Point2<f32>> {
        self.last_position
    }

    pub fn frames_since_detection(&self) -> u32 {
        self.frames_since_detection
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Advance one frame.
    ///
    /// `detections` are this frame's validated candidates, possibly empty.
    pub fn step(
        mut self,
        config: &TrackerConfig,
        detections: &[Detection],
        timestamp_ms: u64,
    ) -> (Self, ChosenDetection) {
        if let Some(chosen) = self.select(config, detections).copied() {
            if self.last_position.is_none() {
                debug!(x = chosen.center.x, y = chosen.center.y, "ball acquired");
            }
            self.last_position = Some(chosen.center);
            self.frames_since_detection = 0;
            self.history.push(HistoryEntry {
                center: chosen.center,
                confidence: chosen.confidence,
                timestamp_ms,
            });
            let output = ChosenDetection::Tracked {
                center: chosen.center,
                confidence: chosen.confidence,
                bbox: chosen.bbox,
            };
            return (self, output);
        }

        self.frames_since_detection = self.frames_since_detection.saturating_add(1);
        if self.frames_since_detection > config.max_gap_frames {
            if self.last_position.is_some() {
                debug!(
                    gap = self.frames_since_detection,
                    last_seen_ms = self.history.last().map(|e| e.timestamp_ms),
                    mean_confidence = self.history.mean_confidence(),
                    "ball lost"
                );
            }
            self.last_position = None;
            self.history.clear();
            return (self, ChosenDetection::None);
        }

        let output = match self.last_position {
            Some(center) => ChosenDetection::LastKnown {
                center,
                frames_since_seen: self.frames_since_detection,
            },
            None => ChosenDetection::None,
        };
        trace!(gap = self.frames_since_detection, "no ball this frame");
        (self, output)
    }

    fn select<'a>(
        &self,
        config: &TrackerConfig,
        detections: &'a [Detection],
    ) -> Option<&'a Detection> {
        if let Some(mean) = self.history.mean_center() {
            return matching::best_by_trajectory(detections, &mean, &config.weights());
        }

        if let Some(last) = self.last_position {
            let (closest, dist) = matching::nearest(detections, &last)?;
            if dist <= config.max_match_distance {
                return Some(closest);
            }
        }

        matching::most_confident(detections)
    }
}

/// Owns the tracker configuration and state across frames.
#[derive(Debug, Clone)]
pub struct BallTracker {
    config: TrackerConfig,
    state: TrackerState,
}

impl Default for BallTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl BallTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let state = TrackerState::new(config.history_size);
        Self { config, state }
    }

    pub fn update(&mut self, detections: &[Detection], timestamp_ms: u64) -> ChosenDetection {
        let state = std::mem::take(&mut self.state);
        let (state, chosen) = state.step(&self.config, detections, timestamp_ms);
        self.state = state;
        chosen
    }

    pub fn reset(&mut self) {
        self.state = TrackerState::new(self.config.history_size);
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
