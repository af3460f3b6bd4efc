//! Oscillation detector turning a 1-D position stream into dribble events.

use serde::{Deserialize, Serialize};

/// Direction of travel between two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

/// Thresholds for the dribble state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DribbleConfig {
    /// Moves smaller than this are treated as jitter.
    pub deadzone: f32,
    /// Peak-to-trough travel required for a bounce to count.
    pub min_amplitude: f32,
    /// Drop from the last peak that arms a pending bounce.
    pub min_down_travel: f32,
    /// Minimum time between two counted bounces.
    pub cooldown_ms: u64,
}

impl Default for DribbleConfig {
    fn default() -> Self {
        Self {
            deadzone: 0.02,
            min_amplitude: 0.08,
            min_down_travel: 0.05,
            cooldown_ms: 400,
        }
    }
}

impl DribbleConfig {
    /// Classify a position change, `None` inside the deadzone.
    pub fn classify(&self, delta: f32) -> Option<Direction> {
        if delta.abs() < self.deadzone {
            None
        } else if delta < 0.0 {
            Some(Direction::Down)
        } else {
            Some(Direction::Up)
        }
    }
}

/// Emitted once per counted dribble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DribbleEvent {
    /// Count after this dribble.
    pub count: u64,
    pub timestamp_ms: u64,
    /// Peak-to-trough travel of the bounce.
    pub amplitude: f32,
}

/// Motion state of the dribble detector.
///
/// The default value is the cold-start state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DribbleMotion {
    pub last_pos: Option<f32>,
    pub min_pos: Option<f32>,
    pub max_pos: Option<f32>,
    pub last_direction: Option<Direction>,
    pub last_count_ms: Option<u64>,
    pub count: u64,
    pub pending_bounce: bool,
}

impl DribbleMotion {
    /// Feed one position sample taken at `timestamp_ms`.
    ///
    /// A dribble is counted on a down-to-up reversal once a deep enough
    /// downstroke has armed a pending bounce, the peak-to-trough amplitude is
    /// large enough, and the cooldown since the previous count has elapsed.
    pub fn step(
        mut self,
        config: &DribbleConfig,
        pos: f32,
        timestamp_ms: u64,
    ) -> (Self, Option<DribbleEvent>) {
        let Some(last_pos) = self.last_pos else {
            self.last_pos = Some(pos);
            self.min_pos = Some(pos);
            self.max_pos = Some(pos);
            return (self, None);
        };

        let direction = config.classify(pos - last_pos);
        let mut event = None;

        match direction {
            Some(Direction::Down) => {
                if self.min_pos.is_none_or(|min| pos < min) {
                    self.min_pos = Some(pos);
                }
                if let Some(max) = self.max_pos {
                    if max - pos >= config.min_down_travel {
                        self.pending_bounce = true;
                    }
                }
            }
            Some(Direction::Up) => {
                if self.max_pos.is_none_or(|max| pos > max) {
                    self.max_pos = Some(pos);
                }
            }
            None => {}
        }

        if direction == Some(Direction::Up)
            && self.last_direction == Some(Direction::Down)
            && self.pending_bounce
        {
            let amplitude = match (self.min_pos, self.max_pos) {
                (Some(min), Some(max)) => (max - min).abs(),
                _ => 0.0,
            };
            let cooled_down = self
                .last_count_ms
                .is_none_or(|prev| timestamp_ms.saturating_sub(prev) > config.cooldown_ms);

            if cooled_down && amplitude >= config.min_amplitude {
                self.count += 1;
                self.last_count_ms = Some(timestamp_ms);
                self.min_pos = Some(pos);
                self.max_pos = Some(pos);
                self.pending_bounce = false;
                event = Some(DribbleEvent {
                    count: self.count,
                    timestamp_ms,
                    amplitude,
                });
            }
        }

        // A new downstroke before any bounce qualified: start over from the
        // last peak so old travel does not accumulate.
        if direction == Some(Direction::Down) && self.last_direction == Some(Direction::Up) {
            self.max_pos = Some(last_pos);
            self.min_pos = Some(pos);
            self.pending_bounce = false;
        }

        if direction.is_some() {
            self.last_direction = direction;
        }
        self.last_pos = Some(pos);

        (self, event)
    }
}
