//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Type alias for positional node indexing inside a network.
///
/// Node order in a network is stable, so the index doubles as the handle the
/// scheduler uses to reach a node without owning it.
pub type NodeIndex = u32;

/// Node identifier.
///
/// Uniqueness is the responsibility of whoever builds the network; the type
/// itself only carries the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Conventional identifier for the node at `index` in a generated network.
    pub fn indexed(index: NodeIndex) -> Self {
        Self(format!("node-{index}"))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

static NEXT_PARAMETER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a parameter.
///
/// Every parameter receives a process-unique id when it is created. Two
/// parameters that share a name still have different ids, which is what lets a
/// registry reject relations built against another registry's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(u64);

impl ParameterId {
    /// Allocate a fresh, never-before-seen parameter id.
    pub fn fresh() -> Self {
        Self(NEXT_PARAMETER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Param({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_parameter_ids_are_distinct() {
        let a = ParameterId::fresh();
        let b = ParameterId::fresh();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn test_indexed_node_id() {
        assert_eq!(NodeId::indexed(3).as_str(), "node-3");
        assert_eq!(NodeId::from("alpha").to_string(), "alpha");
    }

    #[test]
    fn test_node_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&NodeId::new("node-7")).unwrap();
        assert_eq!(json, "\"node-7\"");
    }
}
