//! Frame processing: inference and decoding, then tracking and counting.

use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use super::InferenceSource;
use super::report::{FrameError, FrameErrorKind, FrameReport};
use crate::config::Config;
use crate::decoder::{BoxValidator, YoloDecoder};
use crate::dribble::{DribbleEvent, DrillSession};
use crate::tracker::{BallTracker, ChosenDetection, Detection};

/// One camera frame as delivered by the frame source.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub id: u64,
    pub timestamp_ms: u64,
    pub width: u32,
    pub height: u32,
    /// `None` when the camera delivered no pixel buffer.
    pub pixels: Option<&'a [u8]>,
}

/// Validated candidates for one frame, handed from the real-time context to
/// the tracking context.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub id: u64,
    pub timestamp_ms: u64,
    pub width: u32,
    pub height: u32,
    pub detections: Vec<Detection>,
    pub error: Option<FrameError>,
}

/// Real-time half of the pipeline: inference, decoding and box validation.
///
/// Never fails: every problem is folded into [`DecodedFrame::error`] with an
/// empty candidate list.
pub struct FrameProcessor<S: InferenceSource> {
    source: S,
    decoder: YoloDecoder,
    validator: BoxValidator,
}

impl<S: InferenceSource> FrameProcessor<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            source,
            decoder: YoloDecoder::new(config.decoder.clone()),
            validator: BoxValidator::new(config.boxes.clone()),
        }
    }

    pub fn process(&mut self, frame: &Frame<'_>) -> DecodedFrame {
        let (detections, error) = match self.detect(frame) {
            Ok(detections) => (detections, None),
            Err(error) => {
                warn!(
                    frame = frame.id,
                    kind = ?error.kind,
                    message = %error.message,
                    "frame produced no detections"
                );
                (Vec::new(), Some(error))
            }
        };
        DecodedFrame {
            id: frame.id,
            timestamp_ms: frame.timestamp_ms,
            width: frame.width,
            height: frame.height,
            detections,
            error,
        }
    }

    fn detect(&mut self, frame: &Frame<'_>) -> Result<Vec<Detection>, FrameError> {
        let pixels = frame.pixels.ok_or_else(|| {
            FrameError::new(
                FrameErrorKind::NoFrameBuffer,
                "frame carries no pixel buffer",
            )
        })?;

        let source = &mut self.source;
        let output = panic::catch_unwind(AssertUnwindSafe(|| {
            source.infer(pixels, frame.width, frame.height)
        }))
        .map_err(|payload| {
            FrameError::new(FrameErrorKind::InferenceFailed, panic_message(payload.as_ref()))
        })?
        .map_err(|e| FrameError::new(FrameErrorKind::InferenceFailed, e.to_string()))?;

        let raw = self
            .decoder
            .decode(output.view())
            .map_err(|e| FrameError::new(FrameErrorKind::MalformedOutput, e.to_string()))?;

        Ok(self.validator.detections(&raw))
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("inference panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("inference panicked: {s}")
    } else {
        "inference panicked".to_string()
    }
}

/// Result of running one frame through the whole pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub report: FrameReport,
    pub chosen: ChosenDetection,
    pub event: Option<DribbleEvent>,
}

/// Apply a decoded frame to the tracker and the session.
pub(crate) fn track_frame(
    tracker: &mut BallTracker,
    session: &mut DrillSession,
    frame: &DecodedFrame,
) -> FrameOutcome {
    let chosen = tracker.update(&frame.detections, frame.timestamp_ms);
    let event = session.report_detection(&chosen, frame.timestamp_ms);
    FrameOutcome {
        report: FrameReport::new(frame, &chosen),
        chosen,
        event,
    }
}

/// A single-threaded pipeline bundling inference, tracking and counting.
///
/// This struct provides a convenient way to run the whole chain inline, for
/// replaying recordings or when the caller already runs off the camera
/// thread. For split real-time operation use [`FrameProcessor`] with a
/// [`TrackingWorker`](super::TrackingWorker).
pub struct TrackerPipeline<S: InferenceSource> {
    processor: FrameProcessor<S>,
    tracker: BallTracker,
    session: DrillSession,
}

impl<S: InferenceSource> TrackerPipeline<S> {
    /// Create a new pipeline with the given inference source and configuration.
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            processor: FrameProcessor::new(source, config),
            tracker: BallTracker::new(config.tracker.clone()),
            session: DrillSession::new(config.session.clone(), config.dribble.clone()),
        }
    }

    /// Create a new pipeline with default configuration.
    pub fn with_default_config(source: S) -> Self {
        Self::new(source, &Config::default())
    }

    /// Process a single frame end to end.
    pub fn process_frame(&mut self, frame: &Frame<'_>) -> FrameOutcome {
        let decoded = self.processor.process(frame);
        track_frame(&mut self.tracker, &mut self.session, &decoded)
    }

    pub fn tracker(&self) -> &BallTracker {
        &self.tracker
    }

    pub fn session(&self) -> &DrillSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DrillSession {
        &mut self.session
    }

    pub fn processor_mut(&mut self) -> &mut FrameProcessor<S> {
        &mut self.processor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::integration::TensorBuilder;
    use ndarray::{ArrayD, IxDyn};

    struct MockInference {
        outputs: Vec<Result<ArrayD<f32>, InferenceError>>,
    }

    impl InferenceSource for MockInference {
        type Error = InferenceError;

        fn infer(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<ArrayD<f32>, Self::Error> {
            self.outputs.remove(0)
        }
    }

    struct PanickingInference;

    impl InferenceSource for PanickingInference {
        type Error = std::convert::Infallible;

        fn infer(&mut self, _: &[u8], _: u32, _: u32) -> Result<ArrayD<f32>, Self::Error> {
            panic!("model exploded")
        }
    }

    fn frame(id: u64, pixels: Option<&[u8]>) -> Frame<'_> {
        Frame {
            id,
            timestamp_ms: id * 40,
            width: 1920,
            height: 1080,
            pixels,
        }
    }

    #[test]
    fn test_tracker_pipeline() {
        let ball = TensorBuilder::new()
            .xywh(0.5, 0.4, 0.1, 0.1, 0.9)
            .background(8)
            .build();
        let source = MockInference {
            outputs: vec![Ok(ball)],
        };

        let mut pipeline = TrackerPipeline::with_default_config(source);
        let outcome = pipeline.process_frame(&frame(1, Some(&[0u8; 4])));

        assert!(outcome.report.tracked);
        assert_eq!(outcome.report.detections.len(), 1);
        assert!((outcome.report.detections[0].center_y - 0.4).abs() < 1e-6);
        assert!(outcome.event.is_none());
    }

    #[test]
    fn test_failures_become_reports() {
        let malformed = ArrayD::<f32>::zeros(IxDyn(&[1, 4, 10]));
        let source = MockInference {
            outputs: vec![
                Err(InferenceError::Inference("device lost".into())),
                Ok(malformed),
            ],
        };
        let mut processor = FrameProcessor::new(source, &Config::default());

        let missing = processor.process(&frame(1, None));
        assert_eq!(
            missing.error.as_ref().map(|e| e.kind),
            Some(FrameErrorKind::NoFrameBuffer)
        );

        let failed = processor.process(&frame(2, Some(&[0u8; 4])));
        let error = failed.error.unwrap();
        assert_eq!(error.kind, FrameErrorKind::InferenceFailed);
        assert!(error.message.contains("device lost"));
        assert!(failed.detections.is_empty());

        let bad_shape = processor.process(&frame(3, Some(&[0u8; 4])));
        assert_eq!(
            bad_shape.error.map(|e| e.kind),
            Some(FrameErrorKind::MalformedOutput)
        );
        assert!(bad_shape.detections.is_empty());
    }

    #[test]
    fn test_panicking_inference_is_contained() {
        let mut pipeline = TrackerPipeline::with_default_config(PanickingInference);
        let outcome = pipeline.process_frame(&frame(1, Some(&[0u8; 4])));
        assert_eq!(outcome.report.error, Some(FrameErrorKind::InferenceFailed));
        assert!(outcome.report.message.unwrap().contains("model exploded"));

        // The loop keeps going.
        let outcome = pipeline.process_frame(&frame(2, Some(&[0u8; 4])));
        assert!(!outcome.report.tracked);
    }
}
