//! Error types for the network model and the scheduler.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by nodes and networks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// Latency factors must be non-negative.
    #[error("latency factor cannot be negative (got {0})")]
    NegativeFactor(f64),

    /// Base latencies must be non-negative.
    #[error("base latency cannot be negative (got {0})")]
    NegativeLatency(f64),

    /// NaN or infinity where a finite value is required.
    #[error("non-finite value for {0}")]
    NonFinite(String),

    /// No node with this index exists.
    #[error("unknown node index {0}")]
    UnknownNode(u32),

    /// The network configuration cannot be built.
    #[error("invalid network config: {0}")]
    InvalidConfig(String),
}

/// Errors raised by the scheduler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    /// The event would fire before the current simulation time.
    #[error("event at {event:?} is earlier than current time {now:?}")]
    EventInPast { event: Duration, now: Duration },

    /// Simulation time never moves backward.
    #[error("cannot run until {stop:?}: current time is already {now:?}")]
    TimeRegression { stop: Duration, now: Duration },

    /// Delays must be finite and non-negative.
    #[error("invalid delay: {0} seconds")]
    InvalidDelay(f64),
}
