//! Normalization and plausibility checks for decoded boxes.

use serde::{Deserialize, Serialize};

use super::yolo::RawBox;
use crate::tracker::{Detection, Rect};

/// Coordinate convention of the model's box channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Pixel space if any component exceeds 2 in magnitude, normalized otherwise.
    #[default]
    Auto,
    /// Already in [0, 1].
    Normalized,
    /// Pixels of the model input, divided by `model_input_size`.
    Pixels,
}

/// Geometric bounds a ball box must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxConfig {
    pub coordinate_space: CoordinateSpace,
    /// Side length of the square model input, in pixels.
    pub model_input_size: f32,
    /// Minimum box area as a fraction of the frame.
    pub min_area: f32,
    /// Maximum box area as a fraction of the frame.
    pub max_area: f32,
    /// Minimum length of the shorter side.
    pub min_dimension: f32,
    pub min_aspect: f32,
    pub max_aspect: f32,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            coordinate_space: CoordinateSpace::Auto,
            model_input_size: 960.0,
            min_area: 0.001,
            max_area: 0.3,
            min_dimension: 0.01,
            min_aspect: 0.5,
            max_aspect: 2.0,
        }
    }
}

/// A box normalized to the unit square, in top-left form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedBox {
    pub rect: Rect,
    pub conf: f32,
}

impl ValidatedBox {
    pub fn into_detection(self) -> Detection {
        Detection::new(self.rect, self.conf)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoxValidator {
    config: BoxConfig,
}

impl BoxValidator {
    pub fn new(config: BoxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoxConfig {
        &self.config
    }

    /// Map a raw box into the unit square.
    ///
    /// The result is standardized and clamped but not yet checked for
    /// plausibility.
    pub fn normalize(&self, raw: &RawBox) -> Rect {
        let pixels = match self.config.coordinate_space {
            CoordinateSpace::Normalized => false,
            CoordinateSpace::Pixels => true,
            CoordinateSpace::Auto => {
                [raw.x, raw.y, raw.w, raw.h].iter().any(|v| v.abs() > 2.0)
            }
        };

        let rect = if pixels {
            raw.rect().scaled_down(self.config.model_input_size)
        } else {
            raw.rect()
        };
        rect.standardized().clamped_to_unit()
    }

    /// Whether a normalized box has a plausible size and shape for a ball.
    pub fn is_plausible(&self, rect: &Rect) -> bool {
        let area = rect.area();
        if area < self.config.min_area || area > self.config.max_area {
            return false;
        }
        if rect.min_side() < self.config.min_dimension {
            return false;
        }
        let aspect = rect.aspect_ratio();
        (self.config.min_aspect..=self.config.max_aspect).contains(&aspect)
    }

    /// Normalize and check one box, returning `None` if it is rejected.
    pub fn validate(&self, raw: &RawBox) -> Option<ValidatedBox> {
        if !raw.is_finite() {
            return None;
        }
        let rect = self.normalize(raw);
        if rect.width <= 0.0 || rect.height <= 0.0 || !self.is_plausible(&rect) {
            return None;
        }
        Some(ValidatedBox {
            rect,
            conf: raw.conf,
        })
    }

    /// Validate a decoded batch, preserving its order.
    pub fn detections(&self, raw: &[RawBox]) -> Vec<Detection> {
        raw.iter()
            .filter_map(|b| self.validate(b))
            .map(ValidatedBox::into_detection)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_square_box_accepted() {
        let validator = BoxValidator::default();
        let b = validator
            .validate(&RawBox::new(0.5, 0.5, 0.1, 0.1, 0.9))
            .unwrap();
        assert_relative_eq!(b.rect.x, 0.45, epsilon = 1e-6);
        assert_relative_eq!(b.rect.y, 0.45, epsilon = 1e-6);
        assert_relative_eq!(b.rect.width, 0.1, epsilon = 1e-6);
        assert_eq!(b.conf, 0.9);
    }

    #[test]
    fn test_elongated_box_rejected() {
        let validator = BoxValidator::default();
        assert!(validator.validate(&RawBox::new(0.5, 0.5, 0.3, 0.1, 0.9)).is_none());
        assert!(validator.validate(&RawBox::new(0.5, 0.5, 0.1, 0.3, 0.9)).is_none());
    }

    #[test]
    fn test_area_and_dimension_bounds() {
        let validator = BoxValidator::default();
        // area 0.0004 < 0.001
        assert!(validator.validate(&RawBox::new(0.5, 0.5, 0.02, 0.02, 0.9)).is_none());
        // area 0.36 > 0.3
        assert!(validator.validate(&RawBox::new(0.5, 0.5, 0.6, 0.6, 0.9)).is_none());
    }

    #[test]
    fn test_auto_detects_pixel_space() {
        let validator = BoxValidator::default();
        let b = validator
            .validate(&RawBox::new(480.0, 240.0, 96.0, 96.0, 0.8))
            .unwrap();
        let c = b.rect.center();
        assert_relative_eq!(c.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(c.y, 0.25, epsilon = 1e-6);
        assert_relative_eq!(b.rect.width, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_explicit_pixel_space_scales_small_values() {
        let validator = BoxValidator::new(BoxConfig {
            coordinate_space: CoordinateSpace::Pixels,
            model_input_size: 2.0,
            ..BoxConfig::default()
        });
        let b = validator
            .validate(&RawBox::new(1.0, 1.0, 0.4, 0.4, 0.8))
            .unwrap();
        assert_relative_eq!(b.rect.width, 0.2, epsilon = 1e-6);
        assert_relative_eq!(b.rect.center().x, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_normalized_space_never_rescales() {
        let validator = BoxValidator::new(BoxConfig {
            coordinate_space: CoordinateSpace::Normalized,
            ..BoxConfig::default()
        });
        // Would be pixels under `Auto`; here it clamps to a sliver and is rejected.
        assert!(validator.validate(&RawBox::new(480.0, 240.0, 96.0, 96.0, 0.8)).is_none());
    }

    #[test]
    fn test_box_straddling_edge_is_clamped() {
        let validator = BoxValidator::default();
        let b = validator
            .validate(&RawBox::new(0.98, 0.5, 0.1, 0.1, 0.9))
            .unwrap();
        assert!(b.rect.x + b.rect.width <= 1.0);
        assert_relative_eq!(b.rect.width, 0.07, epsilon = 1e-5);
    }

    #[test]
    fn test_non_finite_fields_rejected() {
        let validator = BoxValidator::default();
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(validator.validate(&RawBox::new(bad, 0.5, 0.1, 0.1, 0.9)).is_none());
            assert!(validator.validate(&RawBox::new(0.5, bad, 0.1, 0.1, 0.9)).is_none());
            assert!(validator.validate(&RawBox::new(0.5, 0.5, bad, 0.1, 0.9)).is_none());
            assert!(validator.validate(&RawBox::new(0.5, 0.5, 0.1, bad, 0.9)).is_none());
            assert!(validator.validate(&RawBox::new(0.5, 0.5, 0.1, 0.1, bad)).is_none());
        }
    }

    fn coordinate() -> impl Strategy<Value = f32> {
        prop_oneof![
            8 => -1500.0f32..1500.0,
            1 => Just(f32::NAN),
            1 => Just(f32::INFINITY),
            1 => Just(f32::NEG_INFINITY),
            1 => any::<f32>(),
        ]
    }

    proptest! {
        #[test]
        fn validated_boxes_stay_in_unit_square(
            x in coordinate(),
            y in coordinate(),
            w in coordinate(),
            h in coordinate(),
            conf in coordinate(),
        ) {
            let validator = BoxValidator::default();
            if let Some(b) = validator.validate(&RawBox::new(x, y, w, h, conf)) {
                prop_assert!(b.conf.is_finite());
                let r = b.rect;
                for v in [r.x, r.y, r.width, r.height] {
                    prop_assert!((0.0..=1.0).contains(&v));
                }
                prop_assert!(r.width > 0.0 && r.height > 0.0);
                prop_assert!(r.x + r.width <= 1.0 + 1e-6);
                prop_assert!(r.y + r.height <= 1.0 + 1e-6);
            }
        }

        #[test]
        fn aspect_three_is_always_rejected(
            cx in 0.3f32..0.7,
            cy in 0.2f32..0.8,
            h in 0.01f32..0.2,
        ) {
            let validator = BoxValidator::default();
            prop_assert!(validator.validate(&RawBox::new(cx, cy, 3.0 * h, h, 0.9)).is_none());
        }
    }
}
