use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::DispatchError;

/// Node kinds accepted in the graph request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Producer,
    Consumer,
    Battery,
    Junction,
}

impl FromStr for NodeType {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "producer" => Ok(NodeType::Producer),
            "consumer" => Ok(NodeType::Consumer),
            "battery" => Ok(NodeType::Battery),
            "junction" => Ok(NodeType::Junction),
            other => Err(DispatchError::InvalidNodeType(other.to_string())),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeType::Producer => "producer",
            NodeType::Consumer => "consumer",
            NodeType::Battery => "battery",
            NodeType::Junction => "junction",
        };
        write!(f, "{}", s)
    }
}

/// A generating technology placed at a node.
#[derive(Debug, Clone, Serialize)]
pub struct ProducerNode {
    pub node_id: String,
    pub technology: String,
    /// Capital cost per unit of installed capacity.
    pub capacity_cost: f64,
    /// Operating cost per unit of energy produced.
    pub operational_cost: f64,
    /// Lifetime in years used to annualize the capital cost.
    pub operational_lifetime: f64,
    /// Per-timestep availability fractions; empty when the technology has no
    /// availability profile.
    pub availability_profile: Vec<f64>,
    /// Absolute capacity derived from the frontend slider.
    pub installed_capacity: f64,
    /// Whether unused output is tracked as curtailment (renewables).
    pub records_curtailment: bool,
}

/// A demand technology placed at a node.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumerNode {
    pub node_id: String,
    pub technology: String,
    /// Total demand per year in energy units.
    pub yearly_demand: f64,
    /// Per-timestep demand fractions summing to 1; empty when the technology
    /// has no demand profile.
    pub demand_profile: Vec<f64>,
}

/// A storage technology placed at a node.
#[derive(Debug, Clone, Serialize)]
pub struct StorageNode {
    pub node_id: String,
    pub technology: String,
    /// Nameplate energy capacity in energy units.
    pub energy_capacity: f64,
    /// Power rating derived from the frontend slider.
    pub installed_capacity: f64,
}

/// One instantiated entity of the scenario, dispatched by kind.
///
/// Junctions are structural only and never become entities.
#[derive(Debug, Clone, Serialize)]
pub enum NodeEntity {
    Producer(ProducerNode),
    Consumer(ConsumerNode),
    Storage(StorageNode),
}

impl NodeEntity {
    pub fn node_id(&self) -> &str {
        match self {
            NodeEntity::Producer(p) => &p.node_id,
            NodeEntity::Consumer(c) => &c.node_id,
            NodeEntity::Storage(s) => &s.node_id,
        }
    }

    pub fn technology(&self) -> &str {
        match self {
            NodeEntity::Producer(p) => &p.technology,
            NodeEntity::Consumer(c) => &c.technology,
            NodeEntity::Storage(s) => &s.technology,
        }
    }
}

/// The resolved 1-based row indices of the modeled window.
///
/// Its length defines `T`; profiles are selected with these indices and
/// re-indexed 1..=len downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timesteps(pub Vec<usize>);

impl Timesteps {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_parsing_is_case_insensitive() {
        assert_eq!("Producer".parse::<NodeType>().unwrap(), NodeType::Producer);
        assert_eq!("BATTERY".parse::<NodeType>().unwrap(), NodeType::Battery);
        assert_eq!("junction".parse::<NodeType>().unwrap(), NodeType::Junction);
    }

    #[test]
    fn test_node_type_rejects_unknown() {
        let err = "transformer".parse::<NodeType>().unwrap_err();
        assert!(matches!(err, DispatchError::InvalidNodeType(t) if t == "transformer"));
    }

    #[test]
    fn test_timesteps_length() {
        let ts = Timesteps(vec![1, 2, 3, 4]);
        assert_eq!(ts.len(), 4);
        assert!(!ts.is_empty());
        assert!(Timesteps(vec![]).is_empty());
    }
}
