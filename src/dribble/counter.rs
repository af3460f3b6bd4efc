use tracing::info;

use super::motion::{DribbleConfig, DribbleEvent, DribbleMotion};

/// Owns a [`DribbleMotion`] and its thresholds.
#[derive(Debug, Clone, Default)]
pub struct DribbleCounter {
    config: DribbleConfig,
    motion: DribbleMotion,
}

impl DribbleCounter {
    pub fn new(config: DribbleConfig) -> Self {
        Self {
            config,
            motion: DribbleMotion::default(),
        }
    }

    pub fn update(&mut self, pos: f32, timestamp_ms: u64) -> Option<DribbleEvent> {
        let (motion, event) = self.motion.step(&self.config, pos, timestamp_ms);
        self.motion = motion;
        if let Some(event) = &event {
            info!(
                count = event.count,
                amplitude = event.amplitude,
                timestamp_ms = event.timestamp_ms,
                "dribble counted"
            );
        }
        event
    }

    /// Return to the cold-start state with a zero count.
    pub fn reset(&mut self) {
        self.motion = DribbleMotion::default();
    }

    pub fn count(&self) -> u64 {
        self.motion.count
    }

    pub fn motion(&self) -> &DribbleMotion {
        &self.motion
    }

    pub fn config(&self) -> &DribbleConfig {
        &self.config
    }
}
