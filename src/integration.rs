//! Integration module connecting inference backends to the tracking pipeline.
//!
//! The real-time side runs [`FrameProcessor`] on each camera frame and posts
//! the resulting [`DecodedFrame`] into a [`mailbox`]. A [`TrackingWorker`]
//! drains it, runs the tracker and the drill session, and publishes a
//! [`FrameReport`] for the UI. [`TrackerPipeline`] runs the same chain inline.

mod builder;
mod detector;
mod mailbox;
mod pipeline;
mod report;
mod worker;

pub use builder::TensorBuilder;
pub use detector::InferenceSource;
pub use mailbox::{Disconnected, MailboxReceiver, MailboxSender, mailbox};
pub use pipeline::{DecodedFrame, Frame, FrameOutcome, FrameProcessor, TrackerPipeline};
pub use report::{FrameError, FrameErrorKind, FrameReport, LastKnown, ReportedBox};
pub use worker::{SessionHandle, TrackingWorker};

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnInference, BurnModel};
