//! Decoding of raw model output into validated ball candidates.
//!
//! Decoding happens in two steps: [`YoloDecoder`] thresholds and deduplicates
//! the anchors of one output tensor, then [`BoxValidator`] maps each survivor
//! into the unit square and drops shapes that cannot be a ball.

mod validate;
mod yolo;

pub use validate::{BoxConfig, BoxValidator, CoordinateSpace, ValidatedBox};
pub use yolo::{DecoderConfig, OUTPUT_CHANNELS, RawBox, YoloDecoder, non_max_suppression};
