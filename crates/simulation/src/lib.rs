//! Discrete-event network simulation.
//!
//! Nodes sit at fixed points in 3-D space and receive time-stamped events.
//! Given the same seed and the same schedule, a run produces identical
//! results every time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Scheduler                          │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Event Queue (BTreeMap<EventKey, Event>)        │ │
//! │  │     Ordered by: time, sequence                     │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ run_until(stop)             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     nodes: HashMap<NodeId, NodeIndex>              │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! └───────────────────────────┼─────────────────────────────┘
//!                             │ deliver
//!                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │  Network: Vec<Node>   (owns nodes, topology, latency)   │
//! │      └── Node::process_inbox (explicit, per node)       │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod event;
mod event_queue;
mod network;
mod node;
mod scheduler;

pub use config::{NetworkConfig, Topology};
pub use error::{NetworkError, SchedulerError};
pub use event::{Event, EventKind};
pub use event_queue::{EventKey, EventQueue};
pub use network::Network;
pub use node::Node;
pub use scheduler::{Scheduler, SchedulerStats};

pub use qrl_types::{NodeId, NodeIndex, Position};
