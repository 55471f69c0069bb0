//! Outbound side of the serial bridge link.
//!
//! The bridge reads one control command per line on stdin:
//!
//! | Command        | Effect                                   |
//! |----------------|------------------------------------------|
//! | `OPEN:<port>`  | open the named serial port               |
//! | `SEND:<hex>`   | write space-separated hex bytes          |
//! | `CLOSE:`       | close the port, keep the process running |
//! | `QUIT:`        | close the port and exit                  |

use std::fmt;
use std::io::{self, Write};

use crossbeam_channel::Sender;
use premaid_protocol::{to_hex_line, Command};

/// A control command for the serial bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Open a serial port.
    Open(String),
    /// Transmit sealed bytes.
    Send(Vec<u8>),
    /// Close the serial port.
    Close,
    /// Exit the bridge.
    Quit,
}

impl BridgeCommand {
    /// Wrap a protocol command for transmission.
    pub fn from_command(command: Command) -> Self {
        BridgeCommand::Send(command.seal())
    }
}

impl fmt::Display for BridgeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeCommand::Open(port) => write!(f, "OPEN:{}", port),
            BridgeCommand::Send(bytes) => write!(f, "SEND:{}", to_hex_line(bytes)),
            BridgeCommand::Close => f.write_str("CLOSE:"),
            BridgeCommand::Quit => f.write_str("QUIT:"),
        }
    }
}

/// Destination for bridge control lines.
pub trait LineSink {
    /// Write one control line. The line terminator is added by the sink.
    fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Write a bridge command.
    fn send_command(&mut self, command: &BridgeCommand) -> io::Result<()> {
        self.send_line(&command.to_string())
    }
}

/// Sink over any writer, flushing after every line.
#[derive(Debug)]
pub struct WriteSink<W: Write> {
    writer: W,
}

impl<W: Write> WriteSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        WriteSink { writer }
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LineSink for WriteSink<W> {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// Channel sink, for driving a receiver without a bridge process.
impl LineSink for Sender<String> {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.send(line.to_string())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "line channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use premaid_protocol::Page;

    #[test]
    fn test_command_rendering() {
        assert_eq!(BridgeCommand::Open("COM3".into()).to_string(), "OPEN:COM3");
        assert_eq!(BridgeCommand::Close.to_string(), "CLOSE:");
        assert_eq!(BridgeCommand::Quit.to_string(), "QUIT:");

        let send = BridgeCommand::from_command(Command::ReadServoStatus { page: Page::High });
        assert_eq!(send.to_string(), "SEND:07 01 00 05 10 E0 F3");
    }

    #[test]
    fn test_write_sink_terminates_lines() {
        let mut sink = WriteSink::new(Vec::new());
        sink.send_command(&BridgeCommand::Open("/dev/ttyUSB0".into()))
            .unwrap();
        sink.send_command(&BridgeCommand::Quit).unwrap();
        assert_eq!(
            String::from_utf8(sink.into_inner()).unwrap(),
            "OPEN:/dev/ttyUSB0\nQUIT:\n"
        );
    }

    #[test]
    fn test_channel_sink() {
        let (mut tx, rx) = crossbeam_channel::unbounded::<String>();
        tx.send_line("SEND:00").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "SEND:00");

        drop(rx);
        assert_eq!(
            tx.send_line("QUIT:").unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }
}
