//! Socket types and functionality for node connections

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::nodes::data_type::DataType;
use crate::nodes::graph::GraphId;
use crate::nodes::interface::NodeData;
use crate::nodes::node::NodeId;

/// Index of a socket within its node's inputs or outputs
pub type PortId = usize;

/// Direction of a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// A typed connection point on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,
    pub name: String,
    pub direction: PortDirection,
    pub data_type: DataType,
    /// Literal used when the socket is unconnected
    pub value: Option<NodeData>,
    /// Inputs only: execution fails if unconnected and without a value
    pub required: bool,
}

impl Port {
    /// Creates a new socket
    pub fn new(
        id: PortId,
        name: impl Into<String>,
        direction: PortDirection,
        data_type: DataType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            direction,
            data_type,
            value: None,
            required: false,
        }
    }

    /// Checks if this socket is an input
    pub fn is_input(&self) -> bool {
        matches!(self.direction, PortDirection::Input)
    }

    /// Checks if this socket is an output
    pub fn is_output(&self) -> bool {
        matches!(self.direction, PortDirection::Output)
    }

    /// Checks if this socket carries control flow
    pub fn is_exec(&self) -> bool {
        self.data_type.is_exec()
    }
}

/// Address of a socket inside a specific graph.
///
/// Minted by [`NodeGraph::input`](crate::nodes::NodeGraph::input) and friends;
/// a reference taken from one graph is rejected by every other graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketRef {
    pub graph: GraphId,
    pub node: NodeId,
    pub port: PortId,
    pub direction: PortDirection,
}
