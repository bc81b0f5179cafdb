//! Simulated nodes.

use crate::error::NetworkError;
use crate::event::{Event, EventKind};
use qrl_types::{NodeId, Position};
use std::collections::{BTreeSet, HashMap};
use tracing::{trace, warn};

/// A participant in the simulated network.
///
/// Events are delivered into the inbox by the scheduler and handled later by
/// [`Node::process_inbox`]. Delivery and processing are separate steps.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    position: Position,
    neighbors: BTreeSet<NodeId>,
    base_latency: HashMap<NodeId, f64>,
    latency_factors: HashMap<NodeId, f64>,
    inbox: Vec<Event>,
    processed_event_count: u64,
    unhandled_event_count: u64,
    transactions_seen: Vec<String>,
    last_block_height: Option<u64>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            neighbors: BTreeSet::new(),
            base_latency: HashMap::new(),
            latency_factors: HashMap::new(),
            inbox: Vec::new(),
            processed_event_count: 0,
            unhandled_event_count: 0,
            transactions_seen: Vec::new(),
            last_block_height: None,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Neighbor IDs in sorted order.
    pub fn neighbors(&self) -> impl Iterator<Item = &NodeId> {
        self.neighbors.iter()
    }

    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_neighbor(&self, id: &NodeId) -> bool {
        self.neighbors.contains(id)
    }

    /// Link to another node. Self-links are ignored. Returns whether the
    /// neighbor was new.
    pub fn add_neighbor(&mut self, id: NodeId) -> bool {
        if id == self.id {
            return false;
        }
        self.neighbors.insert(id)
    }

    /// Set the additive latency towards a neighbor.
    pub fn set_base_latency(&mut self, neighbor: NodeId, latency: f64) -> Result<(), NetworkError> {
        if !latency.is_finite() {
            return Err(NetworkError::NonFinite(format!("base latency to {neighbor}")));
        }
        if latency < 0.0 {
            return Err(NetworkError::NegativeLatency(latency));
        }
        self.base_latency.insert(neighbor, latency);
        Ok(())
    }

    /// Additive latency towards a neighbor, 0.0 if none was set.
    pub fn base_latency(&self, neighbor: &NodeId) -> f64 {
        self.base_latency.get(neighbor).copied().unwrap_or(0.0)
    }

    /// Set or replace the latency multiplier for a neighbor.
    pub fn update_latency_factor(
        &mut self,
        neighbor: impl Into<NodeId>,
        factor: f64,
    ) -> Result<(), NetworkError> {
        let neighbor = neighbor.into();
        if factor < 0.0 {
            return Err(NetworkError::NegativeFactor(factor));
        }
        if !factor.is_finite() {
            return Err(NetworkError::NonFinite(format!("latency factor for {neighbor}")));
        }
        self.latency_factors.insert(neighbor, factor);
        Ok(())
    }

    pub fn latency_factor(&self, neighbor: &NodeId) -> Option<f64> {
        self.latency_factors.get(neighbor).copied()
    }

    /// Euclidean distance to another node.
    pub fn distance(&self, other: &Node) -> f64 {
        self.position.distance_to(&other.position)
    }

    /// Distance-only latency model: `distance / speed_of_light`.
    ///
    /// Zero distance always gives zero latency. Otherwise a non-positive
    /// speed makes the link unusable and yields `f64::INFINITY`.
    pub fn point_latency(&self, other: &Node, speed_of_light: f64) -> f64 {
        let distance = self.distance(other);
        if distance == 0.0 {
            return 0.0;
        }
        if speed_of_light <= 0.0 || speed_of_light.is_nan() {
            return f64::INFINITY;
        }
        distance / speed_of_light
    }

    /// Append an event to the inbox. Never fails.
    pub fn deliver(&mut self, event: Event) {
        trace!(node = %self.id, event = event.type_tag(), "Delivered event");
        self.inbox.push(event);
    }

    /// Drain and handle everything currently in the inbox.
    ///
    /// Events delivered while this runs land in the fresh inbox and wait for
    /// the next call. Returns the number of events handled.
    pub fn process_inbox(&mut self) -> usize {
        let batch = std::mem::take(&mut self.inbox);
        let mut handled = 0;

        for event in batch {
            match event.kind() {
                EventKind::TransactionCreated { tx_id } => {
                    self.transactions_seen.push(tx_id.clone());
                    self.processed_event_count += 1;
                    handled += 1;
                }
                EventKind::BlockCreated { height } => {
                    self.last_block_height = Some(
                        self.last_block_height
                            .map_or(*height, |last| last.max(*height)),
                    );
                    self.processed_event_count += 1;
                    handled += 1;
                }
                EventKind::Custom { tag } => {
                    warn!(node = %self.id, event = %tag, "Received unknown event type");
                    self.unhandled_event_count += 1;
                }
            }
        }

        handled
    }

    pub fn inbox(&self) -> &[Event] {
        &self.inbox
    }

    pub fn inbox_len(&self) -> usize {
        self.inbox.len()
    }

    pub fn processed_event_count(&self) -> u64 {
        self.processed_event_count
    }

    pub fn unhandled_event_count(&self) -> u64 {
        self.unhandled_event_count
    }

    /// Transaction IDs handled so far, in handling order.
    pub fn transactions_seen(&self) -> &[String] {
        &self.transactions_seen
    }

    /// Highest block height handled so far.
    pub fn last_block_height(&self) -> Option<u64> {
        self.last_block_height
    }
}
