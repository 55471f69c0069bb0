//! Background line reader.
//!
//! A dedicated thread blocks on the bridge's output and forwards each line
//! through an unbounded channel. The consumer drains it on its own schedule.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, trace, warn};

/// Lines read from a blocking reader on a background thread.
///
/// # Cancellation
///
/// [`stop`](Self::stop) raises a flag that the thread checks between reads.
/// A thread already blocked inside a read cannot be interrupted; it is
/// detached and exits on its own once the read returns (typically when the
/// bridge process closes its output). No timeout applies to a stalled reader.
#[derive(Debug)]
pub struct LineSource {
    lines: Receiver<String>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl LineSource {
    /// Start reading `reader` on a thread called `name`.
    pub fn spawn<R>(name: &str, reader: R) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || read_lines(reader, tx, thread_stop))?;

        Ok(LineSource {
            lines: rx,
            stop,
            thread: Some(thread),
        })
    }

    /// Next queued line, if any.
    ///
    /// Returns `Err(TryRecvError::Disconnected)` once the reader has exited
    /// and the queue is drained.
    pub fn try_next(&self) -> Result<String, TryRecvError> {
        self.lines.try_recv()
    }

    /// Another handle on the line queue.
    pub fn receiver(&self) -> Receiver<String> {
        self.lines.clone()
    }

    /// Whether the reader thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Ask the reader to stop. Joins it if it has already exited, otherwise
    /// detaches it.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.is_finished() {
                if thread.join().is_err() {
                    warn!("line reader thread panicked");
                }
            } else {
                debug!("line reader blocked in read, detaching");
            }
        }
    }
}

impl Drop for LineSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_lines<R: BufRead>(mut reader: R, tx: Sender<String>, stop: Arc<AtomicBool>) {
    let mut line = String::new();
    while !stop.load(Ordering::Relaxed) {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                debug!("line source reached end of input");
                break;
            }
            Ok(_) => {
                let text = line.trim_end_matches(&['\r', '\n'][..]);
                trace!(len = text.len(), "line received");
                if tx.send(text.to_string()).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "line source read failed");
                break;
            }
        }
    }
}
