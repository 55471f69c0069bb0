//! PreMaid AI servo angle receiver.
//!
//! Polls the robot's controller board for servo telemetry through a serial
//! bridge process and keeps the last-known state of every servo.
//!
//! # Threads
//!
//! - A [`LineSource`] thread blocks on the bridge's stdout and queues lines.
//! - A [`PollLoop`] owns the [`ServoAngleReceiver`] and, once per tick, feeds
//!   it one queued line and lets its [`PollScheduler`] issue requests.
//!
//! The store is only mutated by the poll loop, so no locking is involved.
//!
//! # Example
//!
//! ```rust,ignore
//! use premaid_receiver::{BridgeLink, PollLoop, ReceiverConfig, ServoAngleReceiver};
//!
//! let config = ReceiverConfig::load(path)?;
//! let mut bridge = BridgeLink::spawn(&bridge_path)?;
//! bridge.open_port("COM3")?;
//!
//! let (events_tx, events_rx) = crossbeam_channel::unbounded();
//! let lines = bridge.lines();
//! let receiver = ServoAngleReceiver::new(&config, bridge, events_tx);
//! PollLoop::new(receiver, lines, config.tick_interval()).run_until(&stop, |_| {})?;
//! ```

mod bridge;
mod config;
mod counters;
mod error;
mod line_source;
mod link;
mod poll_loop;
mod receiver;
mod scheduler;
mod store;

pub use bridge::BridgeLink;
pub use config::ReceiverConfig;
pub use counters::{describe_metrics, metric_defs, Metric};
pub use error::{ReceiverError, ReceiverResult};
pub use line_source::LineSource;
pub use link::{BridgeCommand, LineSink, WriteSink};
pub use poll_loop::PollLoop;
pub use receiver::{ReceiverEvent, ReceiverStats, ServoAngleReceiver};
pub use scheduler::{PollMode, PollScheduler, DEFAULT_MAX_CATCHUP, DEFAULT_POLL_INTERVAL};
pub use store::{ServoRecord, ServoStore};
