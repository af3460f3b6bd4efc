//! Per-frame output consumed by the UI.

use serde::Serialize;

use super::pipeline::DecodedFrame;
use crate::tracker::ChosenDetection;

/// Why a frame produced no detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameErrorKind {
    /// The frame source delivered no pixel buffer.
    NoFrameBuffer,
    /// The inference collaborator failed or panicked.
    InferenceFailed,
    /// The model output did not have the expected shape.
    MalformedOutput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameError {
    pub kind: FrameErrorKind,
    pub message: String,
}

impl FrameError {
    pub fn new(kind: FrameErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastKnown {
    pub center_x: f32,
    pub center_y: f32,
    pub frames_since_seen: u32,
}

/// Everything the UI needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub frame_width: u32,
    pub frame_height: u32,
    pub timestamp: u64,
    /// Zero or one box: the tracked ball.
    pub detections: Vec<ReportedBox>,
    pub tracked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_known: Option<LastKnown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FrameErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FrameReport {
    pub fn new(frame: &DecodedFrame, chosen: &ChosenDetection) -> Self {
        let mut report = Self {
            frame_width: frame.width,
            frame_height: frame.height,
            timestamp: frame.timestamp_ms,
            detections: Vec::new(),
            tracked: false,
            last_known: None,
            error: frame.error.as_ref().map(|e| e.kind),
            message: frame.error.as_ref().map(|e| e.message.clone()),
        };

        match *chosen {
            ChosenDetection::Tracked {
                center,
                confidence,
                bbox,
            } => {
                report.tracked = true;
                report.detections.push(ReportedBox {
                    x: bbox.x,
                    y: bbox.y,
                    w: bbox.width,
                    h: bbox.height,
                    center_x: center.x,
                    center_y: center.y,
                    confidence,
                });
            }
            ChosenDetection::LastKnown {
                center,
                frames_since_seen,
            } => {
                report.last_known = Some(LastKnown {
                    center_x: center.x,
                    center_y: center.y,
                    frames_since_seen,
                });
            }
            ChosenDetection::None => {}
        }
        report
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Rect;
    use nalgebra::Point2;
    use serde_json::{Value, json};

    fn frame(error: Option<FrameError>) -> DecodedFrame {
        DecodedFrame {
            id: 7,
            timestamp_ms: 1_234,
            width: 1920,
            height: 1080,
            detections: Vec::new(),
            error,
        }
    }

    #[test]
    fn test_tracked_report_keys() {
        let bbox = Rect::new(0.25, 0.5, 0.5, 0.25);
        let chosen = ChosenDetection::Tracked {
            center: bbox.center(),
            confidence: 0.75,
            bbox,
        };
        let value: Value = serde_json::from_str(
            &FrameReport::new(&frame(None), &chosen).to_json().unwrap(),
        )
        .unwrap();
        assert_eq!(
            value,
            json!({
                "frameWidth": 1920,
                "frameHeight": 1080,
                "timestamp": 1234,
                "detections": [{
                    "x": 0.25, "y": 0.5, "w": 0.5, "h": 0.25,
                    "centerX": 0.5, "centerY": 0.625, "confidence": 0.75
                }],
                "tracked": true
            })
        );
    }

    #[test]
    fn test_last_known_and_error_report() {
        let chosen = ChosenDetection::LastKnown {
            center: Point2::new(0.5, 0.25),
            frames_since_seen: 3,
        };
        let report = FrameReport::new(
            &frame(Some(FrameError::new(FrameErrorKind::InferenceFailed, "boom"))),
            &chosen,
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["tracked"], json!(false));
        assert_eq!(value["detections"], json!([]));
        assert_eq!(
            value["lastKnown"],
            json!({ "centerX": 0.5, "centerY": 0.25, "framesSinceSeen": 3 })
        );
        assert_eq!(value["error"], json!("inference_failed"));
        assert_eq!(value["message"], json!("boom"));
    }

    #[test]
    fn test_lost_report_has_no_marker() {
        let value = serde_json::to_value(FrameReport::new(&frame(None), &ChosenDetection::None))
            .unwrap();
        assert!(value.get("lastKnown").is_none());
        assert!(value.get("error").is_none());
        assert_eq!(value["detections"], json!([]));
    }
}
