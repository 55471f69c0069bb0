//! Cooperative tick driver for a [`ServoAngleReceiver`].
//!
//! Each tick takes at most one queued line from the reader thread, then runs
//! the continuous-mode timer. Frames are therefore handled in arrival order
//! and only ever on the thread that owns the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{info, warn};

use crate::error::ReceiverResult;
use crate::link::LineSink;
use crate::receiver::ServoAngleReceiver;

/// Drives a receiver from a line queue at a fixed tick rate.
#[derive(Debug)]
pub struct PollLoop<S: LineSink> {
    receiver: ServoAngleReceiver<S>,
    lines: Receiver<String>,
    tick_interval: Duration,
    source_closed: bool,
}

impl<S: LineSink> PollLoop<S> {
    pub fn new(
        receiver: ServoAngleReceiver<S>,
        lines: Receiver<String>,
        tick_interval: Duration,
    ) -> Self {
        PollLoop {
            receiver,
            lines,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            source_closed: false,
        }
    }

    /// Run one tick with `elapsed` time since the previous one.
    pub fn tick(&mut self, elapsed: Duration) -> ReceiverResult<()> {
        match self.lines.try_recv() {
            Ok(line) => {
                self.receiver.feed_line(&line);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                if !self.source_closed {
                    warn!("line source closed");
                    self.source_closed = true;
                }
            }
        }
        self.receiver.tick(elapsed)
    }

    /// Tick until `stop` is raised, sleeping between ticks.
    ///
    /// `after_tick` sees the receiver after every tick. A failed request ends
    /// the loop with that error.
    pub fn run_until<F>(&mut self, stop: &AtomicBool, mut after_tick: F) -> ReceiverResult<()>
    where
        F: FnMut(&ServoAngleReceiver<S>),
    {
        info!(tick_ms = self.tick_interval.as_millis() as u64, "poll loop started");
        let mut last = Instant::now();
        while !stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            self.tick(now - last)?;
            last = now;
            after_tick(&self.receiver);

            let spent = now.elapsed();
            if spent < self.tick_interval {
                thread::sleep(self.tick_interval - spent);
            }
        }
        info!("poll loop stopped");
        Ok(())
    }

    /// Whether the line queue has been found disconnected.
    pub fn source_closed(&self) -> bool {
        self.source_closed
    }

    pub fn receiver(&self) -> &ServoAngleReceiver<S> {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut ServoAngleReceiver<S> {
        &mut self.receiver
    }

    pub fn into_receiver(self) -> ServoAngleReceiver<S> {
        self.receiver
    }
}
