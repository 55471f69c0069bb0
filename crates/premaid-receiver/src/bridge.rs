//! Serial bridge subprocess.

use std::io::{self, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdin, Command as Process, Stdio};

use crossbeam_channel::Receiver;
use premaid_protocol::Command;
use tracing::{debug, info, warn};

use crate::error::{ReceiverError, ReceiverResult};
use crate::line_source::LineSource;
use crate::link::{BridgeCommand, LineSink, WriteSink};

/// A running serial bridge process.
///
/// Control commands go to the bridge's stdin; its stdout is read line by line
/// on a background [`LineSource`].
#[derive(Debug)]
pub struct BridgeLink {
    child: Child,
    stdin: Option<WriteSink<ChildStdin>>,
    source: LineSource,
}

impl BridgeLink {
    /// Start the bridge executable at `path`.
    pub fn spawn(path: &Path) -> ReceiverResult<Self> {
        if !path.is_file() {
            return Err(ReceiverError::BridgeNotFound(path.to_path_buf()));
        }

        let mut child = Process::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child.stdin.take().ok_or(ReceiverError::BridgeNotRunning)?;
        let stdout = child.stdout.take().ok_or(ReceiverError::BridgeNotRunning)?;
        let source = LineSource::spawn("bridge-reader", BufReader::new(stdout))?;

        info!(path = %path.display(), pid = child.id(), "serial bridge started");
        Ok(BridgeLink {
            child,
            stdin: Some(WriteSink::new(stdin)),
            source,
        })
    }

    /// Ask the bridge to open a serial port.
    pub fn open_port(&mut self, port: &str) -> ReceiverResult<()> {
        info!(port, "opening serial port");
        self.send(&BridgeCommand::Open(port.to_string()))
    }

    /// Ask the bridge to close the serial port.
    pub fn close_port(&mut self) -> ReceiverResult<()> {
        self.send(&BridgeCommand::Close)
    }

    /// Queue of raw text lines from the bridge.
    pub fn lines(&self) -> Receiver<String> {
        self.source.receiver()
    }

    /// Write a control command.
    pub fn send(&mut self, command: &BridgeCommand) -> ReceiverResult<()> {
        let stdin = self.stdin.as_mut().ok_or(ReceiverError::BridgeNotRunning)?;
        stdin.send_command(command)?;
        Ok(())
    }

    /// Seal and transmit a protocol command.
    pub fn send_command(&mut self, command: Command) -> ReceiverResult<()> {
        self.send(&BridgeCommand::from_command(command))
    }

    /// Release torque on every servo, optionally shutting the link down after.
    pub fn force_all_servo_stop(&mut self, disconnect: bool) -> ReceiverResult<()> {
        info!("releasing all servos");
        self.send_command(Command::AllServoStop)?;
        if disconnect {
            self.shutdown();
        }
        Ok(())
    }

    /// Whether the bridge process is still alive.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Send `QUIT:`, close stdin and stop the reader.
    ///
    /// Does not wait for the process to exit. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.send_command(&BridgeCommand::Quit) {
                debug!(error = %e, "bridge stdin already closed");
            }
        }
        self.source.stop();

        match self.child.try_wait() {
            Ok(Some(status)) => info!(%status, "serial bridge exited"),
            Ok(None) => debug!("serial bridge still running after quit"),
            Err(e) => warn!(error = %e, "could not query serial bridge status"),
        }
    }
}

impl LineSink for BridgeLink {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.send_line(line),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "serial bridge has been shut down",
            )),
        }
    }
}

impl Drop for BridgeLink {
    fn drop(&mut self) {
        self.shutdown();
    }
}
