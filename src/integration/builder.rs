//! Builder for synthetic `[1, 5, N]` model output tensors.

use ndarray::{Array3, ArrayD};

use crate::decoder::OUTPUT_CHANNELS;

/// Builds model output tensors anchor by anchor.
///
/// Useful for stub inference sources and for replaying recorded detections.
#[derive(Debug, Clone, Default)]
pub struct TensorBuilder {
    anchors: Vec<[f32; OUTPUT_CHANNELS]>,
}

impl TensorBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anchor in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32, score: f32) -> Self {
        self.anchors.push([cx, cy, w, h, score]);
        self
    }

    /// Add an anchor in TLWH format (left, top, width, height).
    pub fn tlwh(self, l: f32, t: f32, w: f32, h: f32, score: f32) -> Self {
        self.xywh(l + w / 2.0, t + h / 2.0, w, h, score)
    }

    /// Add `count` anchors with zero confidence, as a real model emits.
    pub fn background(mut self, count: usize) -> Self {
        self.anchors
            .extend(std::iter::repeat_n([0.0; OUTPUT_CHANNELS], count));
        self
    }

    /// Build the final `[1, 5, N]` tensor.
    pub fn build(self) -> ArrayD<f32> {
        let mut tensor = Array3::zeros((1, OUTPUT_CHANNELS, self.anchors.len()));
        for (i, anchor) in self.anchors.iter().enumerate() {
            for (c, value) in anchor.iter().enumerate() {
                tensor[[0, c, i]] = *value;
            }
        }
        tensor.into_dyn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_builder() {
        let tensor = TensorBuilder::new()
            .tlwh(0.1, 0.2, 0.2, 0.2, 0.95)
            .background(3)
            .build();

        assert_eq!(tensor.shape(), &[1, 5, 4]);
        assert!((tensor[[0, 0, 0]] - 0.2).abs() < 1e-6);
        assert!((tensor[[0, 1, 0]] - 0.3).abs() < 1e-6);
        assert_eq!(tensor[[0, 4, 0]], 0.95);
        assert_eq!(tensor[[0, 4, 3]], 0.0);
    }
}
