//! Simulation events.

use qrl_types::NodeId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What an event carries.
///
/// `Custom` is the extension point: nodes have no handler for it and report it
/// as unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A new transaction was created.
    TransactionCreated { tx_id: String },
    /// A block was produced at the given height.
    BlockCreated { height: u64 },
    /// An event type no built-in handler understands.
    Custom { tag: String },
}

impl EventKind {
    /// Type tag used for dispatch and logging.
    pub fn type_tag(&self) -> &str {
        match self {
            EventKind::TransactionCreated { .. } => "TransactionCreated",
            EventKind::BlockCreated { .. } => "BlockCreated",
            EventKind::Custom { tag } => tag,
        }
    }
}

/// A time-stamped unit of work addressed to one node. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    time: Duration,
    target: NodeId,
    kind: EventKind,
}

impl Event {
    /// Create an event firing at `time` (since the simulation epoch).
    pub fn new(time: Duration, target: impl Into<NodeId>, kind: EventKind) -> Self {
        Self {
            time,
            target: target.into(),
            kind,
        }
    }

    /// Shorthand for a [`EventKind::TransactionCreated`] event.
    pub fn transaction_created(
        time: Duration,
        target: impl Into<NodeId>,
        tx_id: impl Into<String>,
    ) -> Self {
        Self::new(
            time,
            target,
            EventKind::TransactionCreated {
                tx_id: tx_id.into(),
            },
        )
    }

    pub fn timestamp(&self) -> Duration {
        self.time
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn type_tag(&self) -> &str {
        self.kind.type_tag()
    }
}
