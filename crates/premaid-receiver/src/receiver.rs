//! Servo angle receiver.
//!
//! Ties the frame assembler, servo store and poll scheduler together. All
//! methods run on the poll loop's thread; nothing here is shared.

use std::time::Duration;

use crossbeam_channel::Sender;
use premaid_protocol::{Command, Frame, FrameAssembler, Page, ServoId, TelemetryPage};
use tracing::{debug, trace};

use crate::config::ReceiverConfig;
use crate::counters::metric_defs;
use crate::error::ReceiverResult;
use crate::link::{BridgeCommand, LineSink};
use crate::scheduler::PollScheduler;
use crate::store::{ServoRecord, ServoStore};

/// Notifications emitted by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverEvent {
    /// A telemetry frame for this page was applied to the store.
    PageUpdated(Page),
    /// Continuous polling was switched on or off.
    ContinuousModeChanged(bool),
}

/// Running totals since the receiver was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Lines passed to [`ServoAngleReceiver::feed_line`].
    pub lines_received: u64,
    /// Telemetry frames applied to the store.
    pub frames_accepted: u64,
    /// Complete frames that failed decoding.
    pub frames_rejected: u64,
    /// Buffer clears after a bad length byte.
    pub desyncs: u64,
    /// Servo status requests written to the sink.
    pub requests_sent: u64,
}

/// Decodes servo telemetry from bridge lines and paces read requests.
#[derive(Debug)]
pub struct ServoAngleReceiver<S: LineSink> {
    assembler: FrameAssembler,
    store: ServoStore,
    scheduler: PollScheduler,
    sink: S,
    events: Sender<ReceiverEvent>,
    stats: ReceiverStats,
}

impl<S: LineSink> ServoAngleReceiver<S> {
    /// Create a receiver writing requests to `sink` and events to `events`.
    ///
    /// Starts in continuous mode when the configuration asks for it; that
    /// initial switch emits a [`ReceiverEvent::ContinuousModeChanged`].
    pub fn new(config: &ReceiverConfig, sink: S, events: Sender<ReceiverEvent>) -> Self {
        let mut receiver = ServoAngleReceiver {
            assembler: FrameAssembler::new(),
            store: ServoStore::new(config.tracked_ids()),
            scheduler: PollScheduler::new(config.poll_interval(), config.max_catchup_requests),
            sink,
            events,
            stats: ReceiverStats::default(),
        };
        if config.continuous {
            receiver.set_continuous_mode(true);
        }
        receiver
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Append one line of bridge output and dispatch at most one frame.
    ///
    /// Returns the page that was updated, if any.
    pub fn feed_line(&mut self, line: &str) -> Option<Page> {
        self.stats.lines_received += 1;
        metric_defs::LINES_RECEIVED.increment(1);

        let desyncs_before = self.assembler.desync_count();
        let frame = self.assembler.feed(line);
        let desyncs = self.assembler.desync_count() - desyncs_before;
        if desyncs > 0 {
            self.stats.desyncs += desyncs;
            metric_defs::BUFFER_DESYNCS.increment(desyncs);
        }

        frame.and_then(|frame| self.dispatch(&frame))
    }

    /// Decode a complete frame and apply it to the store.
    ///
    /// Frames that are not servo telemetry, or whose identifiers do not form
    /// one ordered page, are dropped without touching the store.
    pub fn dispatch(&mut self, frame: &Frame) -> Option<Page> {
        let telemetry = match TelemetryPage::decode(frame) {
            Ok(telemetry) => telemetry,
            Err(e) => {
                trace!(error = %e, len = frame.len(), "frame dropped");
                self.stats.frames_rejected += 1;
                metric_defs::FRAMES_REJECTED.increment(1);
                return None;
            }
        };

        let page = telemetry.page();
        let mut updated = 0usize;
        for sample in telemetry.samples() {
            if self.store.apply(sample) {
                updated += 1;
            }
        }
        debug!(%page, updated, "servo page updated");

        self.stats.frames_accepted += 1;
        metric_defs::FRAMES_ACCEPTED.increment(1);
        let _ = self.events.send(ReceiverEvent::PageUpdated(page));
        Some(page)
    }

    /// Discard any partially assembled frame.
    pub fn reset_buffer(&mut self) {
        self.assembler.reset();
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Advance the poll timer, sending any requests that fall due.
    ///
    /// On a failed send the page stays put and the unsent requests go back on
    /// the timer, so the next tick retries them.
    pub fn tick(&mut self, elapsed: Duration) -> ReceiverResult<()> {
        let due = self.scheduler.tick(elapsed);
        for sent in 0..due {
            if let Err(e) = self.send_request(self.scheduler.next_page()) {
                self.scheduler.defer(due - sent);
                return Err(e);
            }
            self.scheduler.advance();
        }
        Ok(())
    }

    /// Switch continuous polling. Emits an event only when the mode changes.
    pub fn set_continuous_mode(&mut self, enabled: bool) -> bool {
        let changed = self.scheduler.set_continuous_mode(enabled);
        if changed {
            let _ = self
                .events
                .send(ReceiverEvent::ContinuousModeChanged(enabled));
        }
        changed
    }

    /// Request one page now. Does nothing while continuous polling is on.
    pub fn request_single_read(&mut self) -> ReceiverResult<Option<Page>> {
        match self.scheduler.request_single_read() {
            Some(page) => {
                self.send_request(page)?;
                self.scheduler.advance();
                Ok(Some(page))
            }
            None => Ok(None),
        }
    }

    /// Drop stale partial input, then request a fresh page.
    pub fn copy_pose(&mut self) -> ReceiverResult<Option<Page>> {
        self.reset_buffer();
        self.request_single_read()
    }

    /// Seal and transmit a protocol command.
    pub fn send_command(&mut self, command: Command) -> ReceiverResult<()> {
        let bridge_command = BridgeCommand::from_command(command);
        self.sink.send_command(&bridge_command)?;
        if let BridgeCommand::Send(bytes) = &bridge_command {
            metric_defs::BYTES_SENT.increment(bytes.len() as u64);
        }
        Ok(())
    }

    fn send_request(&mut self, page: Page) -> ReceiverResult<()> {
        trace!(%page, "requesting servo status");
        self.send_command(Command::ReadServoStatus { page })?;
        self.stats.requests_sent += 1;
        metric_defs::REQUESTS_SENT.increment(1);
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Last known state of one servo, if tracked.
    pub fn servo(&self, id: ServoId) -> Option<&ServoRecord> {
        self.store.get(id)
    }

    /// All tracked servos.
    pub fn store(&self) -> &ServoStore {
        &self.store
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// Hex characters waiting for the rest of a frame.
    pub fn buffered_len(&self) -> usize {
        self.assembler.buffered_len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
