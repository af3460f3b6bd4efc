use nalgebra::Point2;

use crate::tracker::rect::Rect;

/// Per-frame tracking outcome.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ChosenDetection {
    /// A candidate was selected this frame
    Tracked {
        center: Point2<f32>,
        confidence: f32,
        bbox: Rect,
    },
    /// Nothing detected; coasting on the last accepted position
    LastKnown {
        center: Point2<f32>,
        frames_since_seen: u32,
    },
    /// No track
    #[default]
    None,
}

impl ChosenDetection {
    pub fn is_tracked(&self) -> bool {
        matches!(self, Self::Tracked { .. })
    }

    /// Center of the ball, tracked or remembered.
    pub fn center(&self) -> Option<Point2<f32>> {
        match self {
            Self::Tracked { center, .. } | Self::LastKnown { center, .. } => Some(*center),
            Self::None => None,
        }
    }
}
