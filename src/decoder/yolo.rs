//! Decoding of single-class YOLO output tensors.

use ndarray::{ArrayViewD, Axis, Ix3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::tracker::Rect;

/// Number of channels per anchor: x, y, w, h, confidence.
pub const OUTPUT_CHANNELS: usize = 5;

const EXPECTED_SHAPE: &str = "[1, 5, N]";

/// Configuration for the output decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Anchors scoring below this confidence are discarded.
    pub conf_threshold: f32,
    /// Candidates overlapping a kept box by more than this IoU are suppressed.
    pub iou_threshold: f32,
    /// Upper bound on boxes surviving suppression.
    pub max_detections: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            conf_threshold: 0.05,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}

/// A candidate box straight out of the model, in center form.
///
/// Coordinates may be normalized or in model-input pixels; see
/// [`CoordinateSpace`](crate::decoder::CoordinateSpace).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub conf: f32,
}

impl RawBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32, conf: f32) -> Self {
        Self { x, y, w, h, conf }
    }

    /// The box in top-left form, in whatever space the model emitted.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_xywh(self.x, self.y, self.w, self.h)
    }

    #[inline]
    pub fn iou(&self, other: &RawBox) -> f32 {
        self.rect().iou(&other.rect())
    }

    pub(crate) fn is_finite(&self) -> bool {
        [self.x, self.y, self.w, self.h, self.conf]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Turns a `[1, 5, N]` output tensor into confidence-sorted, deduplicated boxes.
#[derive(Debug, Clone, Default)]
pub struct YoloDecoder {
    config: DecoderConfig,
}

impl YoloDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one output tensor.
    ///
    /// Returns the surviving boxes ordered by descending confidence, or
    /// [`DecodeError::ShapeMismatch`] if the tensor is not `[1, 5, N]`.
    pub fn decode(&self, output: ArrayViewD<'_, f32>) -> Result<Vec<RawBox>, DecodeError> {
        let shape = output.shape().to_vec();
        if shape.len() != 3 || shape[0] != 1 || shape[1] != OUTPUT_CHANNELS {
            warn!(?shape, "rejecting model output with unexpected shape");
            return Err(DecodeError::ShapeMismatch {
                expected: EXPECTED_SHAPE,
                got: shape,
            });
        }

        let output = output
            .into_dimensionality::<Ix3>()
            .map_err(|_| DecodeError::ShapeMismatch {
                expected: EXPECTED_SHAPE,
                got: shape.clone(),
            })?;
        let channels = output.index_axis(Axis(0), 0);

        let mut candidates = Vec::with_capacity(64);
        for anchor in channels.axis_iter(Axis(1)) {
            let candidate = RawBox::new(anchor[0], anchor[1], anchor[2], anchor[3], anchor[4]);
            if !candidate.is_finite() || candidate.conf < self.config.conf_threshold {
                continue;
            }
            if candidate.w <= 0.0 || candidate.h <= 0.0 {
                continue;
            }
            candidates.push(candidate);
        }

        let total = candidates.len();
        let kept = non_max_suppression(
            candidates,
            self.config.iou_threshold,
            self.config.max_detections,
        );
        debug!(anchors = shape[2], candidates = total, kept = kept.len(), "decoded output tensor");

        Ok(kept)
    }
}

/// Greedy non-max suppression.
///
/// Sorts by descending confidence, then keeps a box only if its IoU with every
/// box kept so far is at most `iou_threshold`.
pub fn non_max_suppression(
    mut boxes: Vec<RawBox>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawBox> {
    boxes.sort_by(|a, b| b.conf.total_cmp(&a.conf));

    let mut keep: Vec<RawBox> = Vec::new();
    for candidate in boxes {
        if keep.len() >= max_detections {
            break;
        }
        if keep.iter().all(|k| candidate.iou(k) <= iou_threshold) {
            keep.push(candidate);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, ArrayD, IxDyn};

    fn tensor(anchors: &[[f32; 5]]) -> Array3<f32> {
        let mut t = Array3::zeros((1, OUTPUT_CHANNELS, anchors.len()));
        for (i, a) in anchors.iter().enumerate() {
            for c in 0..OUTPUT_CHANNELS {
                t[[0, c, i]] = a[c];
            }
        }
        t
    }

    #[test]
    fn test_rejects_wrong_rank_and_channels() {
        let decoder = YoloDecoder::default();

        let rank2 = ArrayD::<f32>::zeros(IxDyn(&[5, 10]));
        assert!(matches!(
            decoder.decode(rank2.view()),
            Err(DecodeError::ShapeMismatch { .. })
        ));

        let six_channels = ArrayD::<f32>::zeros(IxDyn(&[1, 6, 10]));
        assert!(decoder.decode(six_channels.view()).is_err());

        let batch_two = ArrayD::<f32>::zeros(IxDyn(&[2, 5, 10]));
        assert!(decoder.decode(batch_two.view()).is_err());
    }

    #[test]
    fn test_empty_anchor_axis() {
        let decoder = YoloDecoder::default();
        let empty = ArrayD::<f32>::zeros(IxDyn(&[1, 5, 0]));
        assert_eq!(decoder.decode(empty.view()).unwrap(), vec![]);
    }

    #[test]
    fn test_below_threshold_is_empty() {
        let decoder = YoloDecoder::default();
        let t = tensor(&[[0.5, 0.5, 0.1, 0.1, 0.01], [0.2, 0.2, 0.1, 0.1, 0.049]]);
        assert!(decoder.decode(t.into_dyn().view()).unwrap().is_empty());
    }

    #[test]
    fn test_drops_degenerate_and_non_finite() {
        let decoder = YoloDecoder::default();
        let t = tensor(&[
            [0.5, 0.5, 0.0, 0.1, 0.9],
            [0.5, 0.5, 0.1, -0.1, 0.9],
            [f32::NAN, 0.5, 0.1, 0.1, 0.9],
            [0.3, 0.3, 0.1, 0.1, 0.6],
        ]);
        let boxes = decoder.decode(t.into_dyn().view()).unwrap();
        assert_eq!(boxes, vec![RawBox::new(0.3, 0.3, 0.1, 0.1, 0.6)]);
    }

    #[test]
    fn test_identical_boxes_keep_higher_confidence() {
        let decoder = YoloDecoder::default();
        let t = tensor(&[[0.5, 0.5, 0.1, 0.1, 0.6], [0.5, 0.5, 0.1, 0.1, 0.8]]);
        let boxes = decoder.decode(t.into_dyn().view()).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].conf, 0.8);
    }

    #[test]
    fn test_sorted_descending_and_disjoint_kept() {
        let decoder = YoloDecoder::default();
        let t = tensor(&[
            [0.2, 0.2, 0.1, 0.1, 0.3],
            [0.8, 0.8, 0.1, 0.1, 0.9],
            [0.5, 0.5, 0.1, 0.1, 0.6],
        ]);
        let confs: Vec<f32> = decoder
            .decode(t.into_dyn().view())
            .unwrap()
            .iter()
            .map(|b| b.conf)
            .collect();
        assert_eq!(confs, vec![0.9, 0.6, 0.3]);
    }

    #[test]
    fn test_nms_threshold_is_inclusive() {
        // Two 1x2 boxes offset by 1/3 of their height overlap with IoU 0.5.
        let a = RawBox::new(0.0, 0.0, 1.0, 3.0, 0.9);
        let b = RawBox::new(0.0, 1.0, 1.0, 3.0, 0.8);
        assert!((a.iou(&b) - 0.5).abs() < 1e-6);

        assert_eq!(non_max_suppression(vec![a, b], 0.5, 10).len(), 2);
        assert_eq!(non_max_suppression(vec![a, b], 0.45, 10).len(), 1);
    }

    #[test]
    fn test_max_detections_caps_output() {
        let boxes = (0..10)
            .map(|i| RawBox::new(i as f32 * 10.0, 0.0, 1.0, 1.0, 0.5))
            .collect();
        assert_eq!(non_max_suppression(boxes, 0.45, 3).len(), 3);
    }
}
