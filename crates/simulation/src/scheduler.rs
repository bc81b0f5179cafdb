//! Discrete-event scheduler.
//!
//! The scheduler owns the event queue and the simulation clock. It does not
//! own nodes: it maps node IDs to indices into a [`Network`] and only borrows
//! the network while dispatching.

use crate::error::SchedulerError;
use crate::event::{Event, EventKind};
use crate::event_queue::{EventKey, EventQueue};
use crate::network::Network;
use qrl_types::{NodeId, NodeIndex};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Counters kept across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Events accepted by `schedule`.
    pub events_scheduled: u64,
    /// Events moved into a node's inbox.
    pub events_dispatched: u64,
    /// Events dropped because their target was not registered.
    pub events_dropped: u64,
}

/// Time-ordered dispatcher of events into node inboxes.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: EventQueue,
    now: Duration,
    nodes: HashMap<NodeId, NodeIndex>,
    stats: SchedulerStats,
}

impl Scheduler {
    /// A scheduler at the epoch with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a node ID to its index in the network passed to `run_until`.
    /// Re-registering an ID replaces the previous index.
    pub fn register_node(&mut self, id: impl Into<NodeId>, index: NodeIndex) {
        let id = id.into();
        trace!(node = %id, index, "Registered node");
        self.nodes.insert(id, index);
    }

    /// Register every node of a network under its current index.
    pub fn register_network(&mut self, network: &Network) {
        for (id, index) in network.node_ids() {
            self.nodes.insert(id.clone(), index);
        }
        debug!(nodes = network.len(), "Registered network");
    }

    pub fn is_registered(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Queue an event.
    ///
    /// Events stamped before the current time are refused with
    /// [`SchedulerError::EventInPast`]. Events at the same time fire in the
    /// order they were scheduled.
    pub fn schedule(&mut self, event: Event) -> Result<EventKey, SchedulerError> {
        if event.timestamp() < self.now {
            return Err(SchedulerError::EventInPast {
                event: event.timestamp(),
                now: self.now,
            });
        }
        self.stats.events_scheduled += 1;
        Ok(self.queue.push(event))
    }

    /// Queue an event `delay` after the current time.
    ///
    /// A delay that would push the timestamp past `Duration::MAX` fails with
    /// [`SchedulerError::InvalidDelay`].
    pub fn schedule_after(
        &mut self,
        delay: Duration,
        target: impl Into<NodeId>,
        kind: EventKind,
    ) -> Result<EventKey, SchedulerError> {
        let time = self
            .now
            .checked_add(delay)
            .ok_or(SchedulerError::InvalidDelay(delay.as_secs_f64()))?;
        self.schedule(Event::new(time, target, kind))
    }

    /// Like [`Scheduler::schedule_after`], with the delay in seconds.
    ///
    /// Lets a sampled parameter value drive scheduling directly. Negative or
    /// non-finite delays fail with [`SchedulerError::InvalidDelay`].
    pub fn schedule_after_secs(
        &mut self,
        delay_secs: f64,
        target: impl Into<NodeId>,
        kind: EventKind,
    ) -> Result<EventKey, SchedulerError> {
        let delay = Duration::try_from_secs_f64(delay_secs)
            .map_err(|_| SchedulerError::InvalidDelay(delay_secs))?;
        self.schedule_after(delay, target, kind)
    }

    /// Current simulation time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Time of the next pending event.
    pub fn peek_time(&self) -> Option<Duration> {
        self.queue.peek_time()
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Dispatch every event due at or before `stop` into its target's inbox.
    ///
    /// Time advances to each event's timestamp as it is dispatched and then
    /// to `stop`. Inboxes are not processed. Events for unregistered targets
    /// (or indices the network does not have) are logged and dropped.
    ///
    /// Returns the number of events dispatched. A `stop` earlier than the
    /// current time fails with [`SchedulerError::TimeRegression`] and leaves
    /// the scheduler untouched.
    pub fn run_until(
        &mut self,
        stop: Duration,
        network: &mut Network,
    ) -> Result<usize, SchedulerError> {
        if stop < self.now {
            warn!(
                stop_secs = stop.as_secs_f64(),
                now_secs = self.now.as_secs_f64(),
                "Refusing to run backward in time"
            );
            return Err(SchedulerError::TimeRegression {
                stop,
                now: self.now,
            });
        }

        trace!(stop_secs = stop.as_secs_f64(), "Running scheduler");

        let mut dispatched = 0;
        while let Some((key, event)) = self.queue.pop_due(stop) {
            // Unreachable through `schedule`, which refuses past events.
            if key.time < self.now {
                warn!(
                    event_secs = key.time.as_secs_f64(),
                    now_secs = self.now.as_secs_f64(),
                    "Event earlier than current time; dropping"
                );
                self.stats.events_dropped += 1;
                continue;
            }
            self.now = key.time;

            let target = self
                .nodes
                .get(event.target())
                .copied()
                .and_then(|index| network.node_mut(index));

            match target {
                Some(node) => {
                    trace!(
                        time = ?self.now,
                        node = %event.target(),
                        event = event.type_tag(),
                        "Dispatching event"
                    );
                    node.deliver(event);
                    self.stats.events_dispatched += 1;
                    dispatched += 1;
                }
                None => {
                    warn!(
                        node = %event.target(),
                        event = event.type_tag(),
                        "Target node not registered; dropping event"
                    );
                    self.stats.events_dropped += 1;
                }
            }
        }

        self.now = stop;

        debug!(
            dispatched,
            remaining_events = self.queue.len(),
            now_secs = self.now.as_secs_f64(),
            "Scheduler run complete"
        );
        Ok(dispatched)
    }
}
