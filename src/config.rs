//! Pipeline configuration.
//!
//! Every section is optional in JSON; missing fields take their defaults.
//!
//! ```json
//! {
//!   "decoder": { "conf_threshold": 0.1 },
//!   "boxes": { "coordinate_space": "pixels", "model_input_size": 640 },
//!   "dribble": { "cooldown_ms": 350 },
//!   "session": { "axis": "y", "drill_duration_ms": null }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decoder::{BoxConfig, DecoderConfig};
use crate::dribble::{DribbleConfig, SessionConfig};
use crate::error::ConfigError;
use crate::tracker::TrackerConfig;

/// Settings for the real-time to tracking handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Decoded frames buffered between the two contexts; 1 is a single slot.
    pub mailbox_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub decoder: DecoderConfig,
    pub boxes: BoxConfig,
    pub tracker: TrackerConfig,
    pub dribble: DribbleConfig,
    pub session: SessionConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject values that would make a stage misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("decoder.conf_threshold", self.decoder.conf_threshold)?;
        unit_interval("decoder.iou_threshold", self.decoder.iou_threshold)?;
        if self.decoder.max_detections == 0 {
            return Err(ConfigError::invalid("decoder.max_detections", "must be at least 1"));
        }

        let boxes = &self.boxes;
        positive("boxes.model_input_size", boxes.model_input_size)?;
        unit_interval("boxes.min_area", boxes.min_area)?;
        unit_interval("boxes.max_area", boxes.max_area)?;
        if boxes.min_area > boxes.max_area {
            return Err(ConfigError::invalid(
                "boxes.min_area",
                format!("{} exceeds max_area {}", boxes.min_area, boxes.max_area),
            ));
        }
        unit_interval("boxes.min_dimension", boxes.min_dimension)?;
        positive("boxes.min_aspect", boxes.min_aspect)?;
        if boxes.min_aspect > boxes.max_aspect {
            return Err(ConfigError::invalid(
                "boxes.min_aspect",
                format!("{} exceeds max_aspect {}", boxes.min_aspect, boxes.max_aspect),
            ));
        }

        let tracker = &self.tracker;
        non_negative("tracker.max_match_distance", tracker.max_match_distance)?;
        if tracker.history_size == 0 {
            return Err(ConfigError::invalid("tracker.history_size", "must be at least 1"));
        }
        non_negative("tracker.confidence_weight", tracker.confidence_weight)?;
        non_negative("tracker.proximity_weight", tracker.proximity_weight)?;
        non_negative("tracker.proximity_falloff", tracker.proximity_falloff)?;

        non_negative("dribble.deadzone", self.dribble.deadzone)?;
        non_negative("dribble.min_amplitude", self.dribble.min_amplitude)?;
        non_negative("dribble.min_down_travel", self.dribble.min_down_travel)?;

        unit_interval("session.min_confidence", self.session.min_confidence)?;
        if self.session.drill_duration_ms == Some(0) {
            return Err(ConfigError::invalid(
                "session.drill_duration_ms",
                "must be positive or null",
            ));
        }

        if self.pipeline.mailbox_capacity == 0 {
            return Err(ConfigError::invalid("pipeline.mailbox_capacity", "must be at least 1"));
        }
        Ok(())
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is outside [0, 1]")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must be a non-negative number")))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must be positive")))
    }
}
