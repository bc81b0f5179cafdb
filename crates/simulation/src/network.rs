//! Node collection, topology construction and geometric queries.

use crate::config::{NetworkConfig, Topology};
use crate::error::NetworkError;
use crate::node::Node;
use qrl_types::{NodeId, NodeIndex, Position};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// An ordered, exclusively owned collection of nodes.
///
/// A node's position in the collection is its [`NodeIndex`] and never
/// changes. The scheduler reaches nodes through these indices.
#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<Node>,
    index: HashMap<NodeId, NodeIndex>,
    topology: Topology,
    speed_of_light: f64,
}

impl Network {
    /// Build a network of `node_count` nodes with the given topology and seed,
    /// all other settings at their defaults.
    pub fn new(topology: Topology, node_count: usize, seed: u64) -> Result<Self, NetworkError> {
        Self::from_config(&NetworkConfig::new(topology, node_count).with_seed(seed))
    }

    /// Convenience for [`Topology::Ring`].
    pub fn ring(node_count: usize, seed: u64) -> Result<Self, NetworkError> {
        Self::new(Topology::Ring, node_count, seed)
    }

    /// Build a network from a configuration.
    ///
    /// Nodes are named `node-0 .. node-{n-1}` and scattered uniformly in
    /// `[0, extent)^3`. Identical configs produce identical networks.
    pub fn from_config(config: &NetworkConfig) -> Result<Self, NetworkError> {
        config.validate().map_err(NetworkError::InvalidConfig)?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let nodes = (0..config.node_count)
            .map(|i| {
                let position = Position::new(
                    rng.gen::<f64>() * config.extent,
                    rng.gen::<f64>() * config.extent,
                    rng.gen::<f64>() * config.extent,
                );
                Node::new(NodeId::indexed(i as NodeIndex), position)
            })
            .collect();

        let mut network = Self::from_nodes(nodes);
        network.topology = config.topology;
        network.speed_of_light = config.speed_of_light;

        let n = network.len();
        match config.topology {
            Topology::None => {}
            Topology::Ring => {
                if n >= 2 {
                    for i in 0..n {
                        let next = (i + 1) % n;
                        network.connect(i as NodeIndex, next as NodeIndex, config.base_latency)?;
                    }
                }
            }
            Topology::Mesh => {
                for i in 0..n {
                    for j in (i + 1)..n {
                        network.connect(i as NodeIndex, j as NodeIndex, config.base_latency)?;
                    }
                }
            }
            Topology::Random { edge_probability } => {
                for i in 0..n {
                    for j in (i + 1)..n {
                        if rng.gen_bool(edge_probability) {
                            network.connect(i as NodeIndex, j as NodeIndex, config.base_latency)?;
                        }
                    }
                }
            }
        }

        info!(
            nodes = n,
            topology = ?config.topology,
            seed = config.seed,
            "Network created"
        );
        Ok(network)
    }

    /// Wrap caller-built nodes without adding links.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut network = Self {
            nodes: Vec::with_capacity(nodes.len()),
            index: HashMap::new(),
            topology: Topology::None,
            speed_of_light: NetworkConfig::default().speed_of_light,
        };
        for node in nodes {
            network.add_node(node);
        }
        network
    }

    /// Append a node and return its index.
    ///
    /// The node is not linked to anything. If its ID is already taken the
    /// lookup by ID keeps resolving to the earlier node.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let index = self.nodes.len() as NodeIndex;
        if self.index.contains_key(node.id()) {
            warn!(node = %node.id(), "Duplicate node ID; lookups resolve to the first node");
        } else {
            self.index.insert(node.id().clone(), index);
        }
        self.nodes.push(node);
        index
    }

    /// Link two nodes in both directions with the given base latency.
    ///
    /// Linking a node to itself is a no-op.
    pub fn connect(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        base_latency: f64,
    ) -> Result<(), NetworkError> {
        let id_a = self.node(a).ok_or(NetworkError::UnknownNode(a))?.id().clone();
        let id_b = self.node(b).ok_or(NetworkError::UnknownNode(b))?.id().clone();
        if a == b {
            return Ok(());
        }

        let node_a = &mut self.nodes[a as usize];
        node_a.set_base_latency(id_b.clone(), base_latency)?;
        node_a.add_neighbor(id_b.clone());

        let node_b = &mut self.nodes[b as usize];
        node_b.set_base_latency(id_a.clone(), base_latency)?;
        node_b.add_neighbor(id_a);

        debug!(a, b, "Linked nodes");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn speed_of_light(&self) -> f64 {
        self.speed_of_light
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index as usize)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(index as usize)
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node_by_id(&self, id: &NodeId) -> Option<&Node> {
        self.index_of(id).and_then(|index| self.node(index))
    }

    /// `(id, index)` pairs in index order, for scheduler registration.
    pub fn node_ids(&self) -> impl Iterator<Item = (&NodeId, NodeIndex)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id(), i as NodeIndex))
    }

    /// Euclidean distance between two nodes.
    pub fn distance(&self, a: NodeIndex, b: NodeIndex) -> Option<f64> {
        Some(self.node(a)?.distance(self.node(b)?))
    }

    /// Additive latency model: `base_latency(a -> b) + distance(a, b)`.
    ///
    /// Nodes at the same position (including a node and itself) have zero
    /// latency regardless of any base latency.
    pub fn latency(&self, a: NodeIndex, b: NodeIndex) -> Option<f64> {
        let node_a = self.node(a)?;
        let node_b = self.node(b)?;
        let distance = node_a.distance(node_b);
        if distance == 0.0 {
            return Some(0.0);
        }
        Some(node_a.base_latency(node_b.id()) + distance)
    }

    /// Distance-only latency model, using this network's propagation speed.
    pub fn point_latency(&self, a: NodeIndex, b: NodeIndex) -> Option<f64> {
        Some(self.node(a)?.point_latency(self.node(b)?, self.speed_of_light))
    }

    /// Delay for sending from `a` to `b`: the additive latency scaled by
    /// `a`'s latency factor for `b` (1.0 when unset), in seconds.
    pub fn link_delay(&self, a: NodeIndex, b: NodeIndex) -> Option<Duration> {
        let latency = self.latency(a, b)?;
        let factor = self
            .node(a)?
            .latency_factor(self.node(b)?.id())
            .unwrap_or(1.0);
        Duration::try_from_secs_f64(latency * factor).ok()
    }

    /// Drain every node's inbox in index order. Returns events handled.
    pub fn process_all_inboxes(&mut self) -> usize {
        self.nodes.iter_mut().map(Node::process_inbox).sum()
    }

    /// Drain every node's inbox across the rayon pool.
    ///
    /// Each node is processed by exactly one worker. Per-node results match
    /// [`Network::process_all_inboxes`].
    pub fn process_all_inboxes_parallel(&mut self) -> usize {
        self.nodes.par_iter_mut().map(Node::process_inbox).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(node: &Node) -> Vec<String> {
        node.neighbors().map(|id| id.as_str().to_string()).collect()
    }

    #[test]
    fn test_ring_of_five() {
        let network = Network::ring(5, 7).unwrap();
        assert_eq!(network.len(), 5);

        for i in 0..5u32 {
            let node = network.node(i).unwrap();
            assert_eq!(node.neighbor_count(), 2);
            let prev = NodeId::indexed((i + 4) % 5);
            let next = NodeId::indexed((i + 1) % 5);
            assert!(node.is_neighbor(&prev), "node {i} missing {prev}");
            assert!(node.is_neighbor(&next), "node {i} missing {next}");
        }
    }

    #[test]
    fn test_tiny_rings() {
        assert!(Network::ring(0, 1).unwrap().is_empty());

        let single = Network::ring(1, 1).unwrap();
        assert_eq!(single.node(0).unwrap().neighbor_count(), 0);

        // Both ring directions point at the same peer.
        let pair = Network::ring(2, 1).unwrap();
        assert_eq!(ids(pair.node(0).unwrap()), vec!["node-1"]);
        assert_eq!(ids(pair.node(1).unwrap()), vec!["node-0"]);
    }

    #[test]
    fn test_mesh_links_every_pair() {
        let network = Network::new(Topology::Mesh, 6, 3).unwrap();
        for node in network.nodes() {
            assert_eq!(node.neighbor_count(), 5);
        }
    }

    #[test]
    fn test_random_topology_is_symmetric_and_seeded() {
        let topology = Topology::Random {
            edge_probability: 0.4,
        };
        let a = Network::new(topology, 12, 99).unwrap();
        let b = Network::new(topology, 12, 99).unwrap();

        for (i, node) in a.nodes().iter().enumerate() {
            assert_eq!(ids(node), ids(b.node(i as NodeIndex).unwrap()));
            assert_eq!(node.position(), b.node(i as NodeIndex).unwrap().position());
            for neighbor in node.neighbors() {
                assert!(a.node_by_id(neighbor).unwrap().is_neighbor(node.id()));
            }
        }
    }

    #[test]
    fn test_random_topology_extremes() {
        let empty = Network::new(Topology::Random { edge_probability: 0.0 }, 5, 1).unwrap();
        assert!(empty.nodes().iter().all(|n| n.neighbor_count() == 0));

        let full = Network::new(Topology::Random { edge_probability: 1.0 }, 5, 1).unwrap();
        assert!(full.nodes().iter().all(|n| n.neighbor_count() == 4));
    }

    #[test]
    fn test_positions_stay_inside_extent() {
        let config = NetworkConfig::new(Topology::None, 20).with_extent(10.0);
        let network = Network::from_config(&config).unwrap();
        for node in network.nodes() {
            let p = node.position();
            for c in [p.x, p.y, p.z] {
                assert!((0.0..10.0).contains(&c));
            }
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = NetworkConfig::default().with_speed_of_light(-1.0);
        assert!(matches!(
            Network::from_config(&config),
            Err(NetworkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_additive_latency_and_link_delay() {
        let mut network = Network::from_nodes(vec![
            Node::new("a", Position::new(0.0, 0.0, 0.0)),
            Node::new("b", Position::new(3.0, 4.0, 0.0)),
            Node::new("twin", Position::new(0.0, 0.0, 0.0)),
        ]);
        network.connect(0, 1, 0.5).unwrap();
        network.connect(0, 2, 9.0).unwrap();

        assert_eq!(network.distance(0, 1), Some(5.0));
        assert_eq!(network.latency(0, 1), Some(5.5));
        assert_eq!(network.latency(1, 0), Some(5.5));
        assert_eq!(network.latency(0, 0), Some(0.0));
        // Same position, so base latency does not apply.
        assert_eq!(network.latency(0, 2), Some(0.0));
        assert_eq!(network.point_latency(0, 1), Some(0.5));
        assert_eq!(network.latency(0, 7), None);

        assert_eq!(network.link_delay(0, 1), Some(Duration::from_secs_f64(5.5)));
        network
            .node_mut(0)
            .unwrap()
            .update_latency_factor("b", 2.0)
            .unwrap();
        assert_eq!(network.link_delay(0, 1), Some(Duration::from_secs_f64(11.0)));
        assert_eq!(network.link_delay(1, 0), Some(Duration::from_secs_f64(5.5)));
    }

    #[test]
    fn test_lookup_by_id() {
        let mut network = Network::ring(3, 5).unwrap();
        let index = network.add_node(Node::new("late", Position::ORIGIN));

        assert_eq!(index, 3);
        assert_eq!(network.index_of(&NodeId::from("late")), Some(3));
        assert_eq!(network.node_by_id(&NodeId::from("late")).unwrap().neighbor_count(), 0);
        assert!(network.node_by_id(&NodeId::from("missing")).is_none());
        assert_eq!(network.connect(0, 9, 0.0), Err(NetworkError::UnknownNode(9)));
    }
}
