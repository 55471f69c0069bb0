//! Metric declarations for the receiver.
//!
//! Counters are emitted through the `metrics` facade. Without an installed
//! recorder they are no-ops; [`ReceiverStats`](crate::ReceiverStats) keeps a
//! local copy either way.

use ::metrics::{describe_counter, Unit};

/// A counter declaration with its metadata.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    /// Metric name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Unit of measurement.
    pub unit: Unit,
}

impl Metric {
    /// Declare a counter measured in [`Unit::Count`].
    pub const fn counter(name: &'static str) -> Self {
        Metric {
            name,
            description: "",
            unit: Unit::Count,
        }
    }

    /// Set the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Set the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        describe_counter!(self.name, self.unit, self.description);
    }

    /// Add to the counter.
    pub fn increment(&self, value: u64) {
        ::metrics::counter!(self.name).increment(value);
    }
}

/// All receiver metrics.
pub mod metric_defs {
    use super::Metric;
    use ::metrics::Unit;

    pub const LINES_RECEIVED: Metric = Metric::counter("premaid_lines_received")
        .with_description("Text lines taken from the bridge");

    pub const FRAMES_ACCEPTED: Metric = Metric::counter("premaid_frames_accepted")
        .with_description("Telemetry frames decoded and applied to the store");

    pub const FRAMES_REJECTED: Metric = Metric::counter("premaid_frames_rejected")
        .with_description("Complete frames dropped by signature or layout checks");

    pub const BUFFER_DESYNCS: Metric = Metric::counter("premaid_buffer_desyncs")
        .with_description("Assembly buffer clears after an unusable length byte");

    pub const REQUESTS_SENT: Metric = Metric::counter("premaid_requests_sent")
        .with_description("Servo status requests written to the bridge");

    pub const BYTES_SENT: Metric = Metric::counter("premaid_bytes_sent")
        .with_description("Sealed command bytes written to the bridge")
        .with_unit(Unit::Bytes);

    pub const ALL: &[Metric] = &[
        LINES_RECEIVED,
        FRAMES_ACCEPTED,
        FRAMES_REJECTED,
        BUFFER_DESYNCS,
        REQUESTS_SENT,
        BYTES_SENT,
    ];
}

/// Describe every receiver metric. Call once after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_unique() {
        let names: HashSet<_> = metric_defs::ALL.iter().map(|m| m.name).collect();
        assert_eq!(names.len(), metric_defs::ALL.len());
        assert!(metric_defs::ALL.iter().all(|m| m.name.starts_with("premaid_")));
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
        metric_defs::FRAMES_ACCEPTED.increment(1);
    }
}
