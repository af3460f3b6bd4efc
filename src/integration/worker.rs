//! Tracking context: applies decoded frames off the real-time thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use super::mailbox::{MailboxReceiver, MailboxSender, mailbox};
use super::pipeline::{DecodedFrame, track_frame};
use super::report::FrameReport;
use crate::config::Config;
use crate::dribble::{DribbleEvent, DrillSession};
use crate::error::WorkerError;
use crate::tracker::BallTracker;

struct Shared {
    session: Mutex<DrillSession>,
    latest: RwLock<Option<FrameReport>>,
    count: AtomicU64,
    applied: AtomicU64,
    discarded: AtomicU64,
}

impl Shared {
    fn publish_count(&self, session: &DrillSession) {
        self.count.store(session.count(), Ordering::Release);
    }
}

/// Control and observation surface for the drill, shared with the UI.
///
/// Every mutation of the session happens under one lock, so an ended session
/// never counts a report that was already in flight.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<Shared>,
}

impl SessionHandle {
    pub fn start_session(&self, now_ms: u64) {
        let mut session = self.shared.session.lock();
        session.start(now_ms);
        self.shared.publish_count(&session);
    }

    pub fn end_session(&self) {
        let mut session = self.shared.session.lock();
        session.end();
        self.shared.publish_count(&session);
    }

    /// Feed a coordinate directly, bypassing the tracker.
    pub fn report_position(&self, coordinate: f32, timestamp_ms: u64) -> Option<DribbleEvent> {
        let mut session = self.shared.session.lock();
        let event = session.report_position(coordinate, timestamp_ms);
        self.shared.publish_count(&session);
        event
    }

    /// Dribbles counted in the current session.
    pub fn count(&self) -> u64 {
        self.shared.count.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.shared.session.lock().is_active()
    }

    pub fn time_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.shared.session.lock().time_remaining_ms(now_ms)
    }

    /// Most recent per-frame report, if any frame has been applied.
    pub fn latest_report(&self) -> Option<FrameReport> {
        self.shared.latest.read().clone()
    }

    pub fn frames_applied(&self) -> u64 {
        self.shared.applied.load(Ordering::Relaxed)
    }

    /// Frames skipped because they arrived out of order.
    pub fn frames_discarded(&self) -> u64 {
        self.shared.discarded.load(Ordering::Relaxed)
    }
}

/// Background thread owning the [`BallTracker`].
///
/// Dropping every [`MailboxSender`] returned by [`spawn`](Self::spawn) stops
/// the worker.
pub struct TrackingWorker {
    handle: SessionHandle,
    thread: JoinHandle<()>,
}

impl TrackingWorker {
    /// Validate `config` and start the worker thread.
    pub fn spawn(config: &Config) -> Result<(MailboxSender<DecodedFrame>, Self), WorkerError> {
        config.validate()?;
        let (tx, rx) = mailbox(config.pipeline.mailbox_capacity);
        let shared = Arc::new(Shared {
            session: Mutex::new(DrillSession::new(
                config.session.clone(),
                config.dribble.clone(),
            )),
            latest: RwLock::new(None),
            count: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        });
        let tracker = BallTracker::new(config.tracker.clone());

        let worker_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("ball-tracking".into())
            .spawn(move || run(rx, tracker, &worker_shared))?;

        Ok((
            tx,
            Self {
                handle: SessionHandle { shared },
                thread,
            },
        ))
    }

    pub fn session_handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Wait for the worker to drain the mailbox and exit.
    ///
    /// Returns once all senders have been dropped.
    pub fn shutdown(self) -> thread::Result<()> {
        self.thread.join()
    }
}

fn run(rx: MailboxReceiver<DecodedFrame>, mut tracker: BallTracker, shared: &Shared) {
    let mut last_applied: Option<u64> = None;

    for frame in rx {
        if last_applied.is_some_and(|last| frame.timestamp_ms <= last) {
            warn!(
                frame = frame.id,
                timestamp_ms = frame.timestamp_ms,
                last_applied,
                "discarding out-of-order frame"
            );
            shared.discarded.fetch_add(1, Ordering::Relaxed);
            continue;
        }
        last_applied = Some(frame.timestamp_ms);

        let outcome = {
            let mut session = shared.session.lock();
            let outcome = track_frame(&mut tracker, &mut session, &frame);
            shared.publish_count(&session);
            outcome
        };
        debug!(
            frame = frame.id,
            candidates = frame.detections.len(),
            tracked = outcome.report.tracked,
            "frame applied"
        );
        *shared.latest.write() = Some(outcome.report);
        shared.applied.fetch_add(1, Ordering::Relaxed);
    }

    debug!("tracking worker stopped");
}
