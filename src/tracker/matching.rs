//! Candidate selection utilities for single-ball tracking.

use nalgebra::{Point2, distance};

use crate::tracker::rect::Rect;

/// Detection input for the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Box center in normalized frame coordinates
    pub center: Point2<f32>,
    /// Detection confidence score
    pub confidence: f32,
    /// Bounding box in TLWH format
    pub bbox: Rect,
}

impl Detection {
    pub fn new(bbox: Rect, confidence: f32) -> Self {
        Self {
            center: bbox.center(),
            confidence,
            bbox,
        }
    }
}

/// Weights for scoring candidates against the recent trajectory.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub confidence: f32,
    pub proximity: f32,
    pub falloff: f32,
}

/// `1 / (1 + falloff * d)`: 1 at the anchor, decaying with distance.
#[inline]
pub fn proximity_weight(center: &Point2<f32>, anchor: &Point2<f32>, falloff: f32) -> f32 {
    1.0 / (1.0 + falloff * distance(center, anchor))
}

/// Blend of detector confidence and closeness to `anchor`.
#[inline]
pub fn trajectory_score(det: &Detection, anchor: &Point2<f32>, weights: &ScoreWeights) -> f32 {
    weights.confidence * det.confidence
        + weights.proximity * proximity_weight(&det.center, anchor, weights.falloff)
}

/// Candidate with the best [`trajectory_score`]; ties keep the earliest.
pub fn best_by_trajectory<'a>(
    detections: &'a [Detection],
    anchor: &Point2<f32>,
    weights: &ScoreWeights,
) -> Option<&'a Detection> {
    detections.iter().reduce(|best, det| {
        if trajectory_score(det, anchor, weights) > trajectory_score(best, anchor, weights) {
            det
        } else {
            best
        }
    })
}

/// Candidate closest to `anchor`, with its distance.
pub fn nearest<'a>(
    detections: &'a [Detection],
    anchor: &Point2<f32>,
) -> Option<(&'a Detection, f32)> {
    detections
        .iter()
        .map(|det| (det, distance(&det.center, anchor)))
        .reduce(|best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Highest-confidence candidate; ties keep the earliest.
pub fn most_confident(detections: &[Detection]) -> Option<&Detection> {
    detections
        .iter()
        .reduce(|best, det| if det.confidence > best.confidence { det } else { best })
}
