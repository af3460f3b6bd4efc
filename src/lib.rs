//! Ball detection decoding, single-ball tracking and dribble counting.
//!
//! Each camera frame flows through four stages:
//!
//! 1. [`decoder::YoloDecoder`] turns the `[1, 5, N]` model output into
//!    thresholded, deduplicated [`decoder::RawBox`]es.
//! 2. [`decoder::BoxValidator`] normalizes them into the unit square and keeps
//!    only plausible ball shapes.
//! 3. [`tracker::BallTracker`] picks at most one ball per frame and bridges
//!    short gaps.
//! 4. [`dribble::DrillSession`] feeds the chosen position to the dribble
//!    detector during a timed drill.
//!
//! The [`integration`] module wires the stages to an inference backend and
//! splits them across a real-time and a tracking thread.

pub mod config;
pub mod decoder;
pub mod dribble;
pub mod error;
pub mod integration;
pub mod tracker;

pub use config::Config;
pub use decoder::{BoxValidator, RawBox, YoloDecoder};
pub use dribble::{DribbleEvent, DrillSession};
pub use error::{ConfigError, DecodeError, InferenceError, WorkerError};
pub use integration::{
    FrameProcessor, FrameReport, InferenceSource, SessionHandle, TrackerPipeline, TrackingWorker,
};
pub use tracker::{BallTracker, ChosenDetection, Detection, TrackerConfig};
