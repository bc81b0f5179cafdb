//! Test helpers - seeded fixtures for simulation and parameter-space tests.
//!
//! # Example
//!
//! ```rust
//! use qrl_test_helpers::TestSimulation;
//! use qrl_simulation::{Event, NodeId};
//! use std::time::Duration;
//!
//! // Five nodes in a ring, all registered with a fresh scheduler
//! let mut sim = TestSimulation::ring(5, 42);
//!
//! sim.scheduler
//!     .schedule(Event::transaction_created(Duration::from_millis(10), "node-3", "tx-1"))
//!     .unwrap();
//! sim.run_until(Duration::from_millis(10));
//!
//! let node = sim.network.node_by_id(&NodeId::from("node-3")).unwrap();
//! assert_eq!(node.inbox_len(), 1);
//! ```

pub mod fixtures;

use qrl_simulation::{Network, NetworkConfig, Scheduler, Topology};
use std::time::Duration;

/// A network and a scheduler that already knows all of its nodes.
#[derive(Debug)]
pub struct TestSimulation {
    pub network: Network,
    pub scheduler: Scheduler,
}

impl TestSimulation {
    /// Build from a config and register every node.
    ///
    /// # Panics
    ///
    /// Panics if the config is invalid.
    pub fn from_config(config: &NetworkConfig) -> Self {
        let network = Network::from_config(config).expect("valid network config");
        let mut scheduler = Scheduler::new();
        scheduler.register_network(&network);
        Self { network, scheduler }
    }

    /// A ring of `node_count` nodes placed with `seed`.
    pub fn ring(node_count: usize, seed: u64) -> Self {
        Self::from_config(&NetworkConfig::new(Topology::Ring, node_count).with_seed(seed))
    }

    /// A full mesh of `node_count` nodes placed with `seed`.
    pub fn mesh(node_count: usize, seed: u64) -> Self {
        Self::from_config(&NetworkConfig::new(Topology::Mesh, node_count).with_seed(seed))
    }

    /// Dispatch up to `stop` and return the number of events delivered.
    ///
    /// # Panics
    ///
    /// Panics if `stop` is earlier than the scheduler's current time.
    pub fn run_until(&mut self, stop: Duration) -> usize {
        self.scheduler
            .run_until(stop, &mut self.network)
            .expect("simulation time moves forward")
    }

    /// Dispatch up to `stop`, then drain every inbox. Returns events handled.
    pub fn run_and_process(&mut self, stop: Duration) -> usize {
        self.run_until(stop);
        self.network.process_all_inboxes()
    }
}
