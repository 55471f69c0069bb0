//! PreMaid AI Serial Protocol
//!
//! This crate provides types and utilities for talking to the PreMaid AI
//! controller board through its serial bridge. The bridge relays raw bytes as
//! hex text, two characters per byte, with no separators.
//!
//! # Protocol Overview
//!
//! Every message is a self-describing frame whose first byte is its total
//! length in bytes:
//!
//! - **Commands** (host → board): servo status reads, torque release. The final
//!   byte is an XOR seal over everything before it.
//! - **Responses** (board → host): servo telemetry (`E4 01 00 ...`) carrying
//!   sixteen 14-byte servo records, plus other types such as battery status.
//!
//! Servo telemetry is requested one page (sixteen identifiers) at a time to
//! keep each response inside the link's bandwidth budget.
//!
//! # Example
//!
//! ```rust,ignore
//! use premaid_protocol::{Command, FrameAssembler, Page, TelemetryPage};
//!
//! let request = Command::ReadServoStatus { page: Page::Low }.to_hex_line();
//!
//! let mut assembler = FrameAssembler::new();
//! if let Some(frame) = assembler.feed(&line) {
//!     let telemetry = TelemetryPage::decode(&frame)?;
//! }
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod telemetry;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use telemetry::*;
pub use types::*;
