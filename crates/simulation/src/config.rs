//! Network construction settings.

use serde::{Deserialize, Serialize};

/// Shape of the links between generated nodes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    /// Nodes are placed but left unconnected.
    None,
    /// Node `i` links to `i - 1` and `i + 1` (mod n).
    #[default]
    Ring,
    /// Every pair of distinct nodes is linked.
    Mesh,
    /// Each unordered pair is linked independently with `edge_probability`.
    Random { edge_probability: f64 },
}

/// Configuration for building a [`Network`](crate::Network).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub topology: Topology,
    pub node_count: usize,
    /// Side length of the cube nodes are scattered in.
    pub extent: f64,
    /// Additive latency attached to every generated link.
    pub base_latency: f64,
    /// Propagation speed for the distance-only latency model.
    pub speed_of_light: f64,
    /// Seed for node placement and random topologies.
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            topology: Topology::Ring,
            node_count: 4,
            extent: 100.0,
            base_latency: 0.0,
            speed_of_light: 10.0,
            seed: 12345,
        }
    }
}

impl NetworkConfig {
    pub fn new(topology: Topology, node_count: usize) -> Self {
        Self {
            topology,
            node_count,
            ..Default::default()
        }
    }

    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_base_latency(mut self, base_latency: f64) -> Self {
        self.base_latency = base_latency;
        self
    }

    pub fn with_speed_of_light(mut self, speed_of_light: f64) -> Self {
        self.speed_of_light = speed_of_light;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the settings before any node is built.
    pub fn validate(&self) -> Result<(), String> {
        if !self.extent.is_finite() || self.extent < 0.0 {
            return Err(format!("extent must be finite and >= 0, got {}", self.extent));
        }
        if !self.base_latency.is_finite() || self.base_latency < 0.0 {
            return Err(format!(
                "base_latency must be finite and >= 0, got {}",
                self.base_latency
            ));
        }
        if !self.speed_of_light.is_finite() || self.speed_of_light <= 0.0 {
            return Err(format!(
                "speed_of_light must be finite and > 0, got {}",
                self.speed_of_light
            ));
        }
        if let Topology::Random { edge_probability } = self.topology {
            if !(0.0..=1.0).contains(&edge_probability) {
                return Err(format!(
                    "edge_probability must be in [0, 1], got {edge_probability}"
                ));
            }
        }
        if self.node_count > u32::MAX as usize {
            return Err(format!("too many nodes: {}", self.node_count));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(NetworkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = NetworkConfig::new(Topology::Mesh, 3).with_speed_of_light(0.0);
        assert!(config.validate().is_err());

        let config = NetworkConfig::new(Topology::Random { edge_probability: 1.5 }, 3);
        assert!(config.validate().is_err());

        let config = NetworkConfig::default().with_base_latency(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: NetworkConfig =
            serde_json::from_str(r#"{"topology": {"kind": "mesh"}, "node_count": 6}"#).unwrap();
        assert_eq!(config.topology, Topology::Mesh);
        assert_eq!(config.node_count, 6);
        assert_eq!(config.speed_of_light, 10.0);
        assert_eq!(config.seed, 12345);
    }
}
