//! Node types and core node functionality

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::nodes::data_type::DataType;
use crate::nodes::factory::NodeCategory;
use crate::nodes::interface::NodeData;
use crate::nodes::port::{Port, PortDirection, PortId};

/// Unique identifier for a node, never reused within a graph
pub type NodeId = u64;

/// A single unit of behavior in a build graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Selects the behavior from the node registry
    pub type_id: String,
    pub title: String,
    pub category: NodeCategory,
    /// Participates in the exec chain
    pub is_exec: bool,
    /// At most one node of this type per graph
    pub unique: bool,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    /// Node-local configuration consumed by the behavior
    pub parameters: BTreeMap<String, NodeData>,
}

impl Node {
    /// Creates a new node without sockets
    pub fn new(id: NodeId, type_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            type_id: type_id.into(),
            title: title.into(),
            category: NodeCategory::default(),
            is_exec: false,
            unique: false,
            inputs: vec![],
            outputs: vec![],
            parameters: BTreeMap::new(),
        }
    }

    /// Adds an input socket to the node
    pub fn add_input(&mut self, name: impl Into<String>, data_type: DataType) -> &mut Port {
        let port_id = self.inputs.len();
        self.inputs
            .push(Port::new(port_id, name, PortDirection::Input, data_type));
        &mut self.inputs[port_id]
    }

    /// Adds an output socket to the node
    pub fn add_output(&mut self, name: impl Into<String>, data_type: DataType) -> &mut Port {
        let port_id = self.outputs.len();
        self.outputs
            .push(Port::new(port_id, name, PortDirection::Output, data_type));
        &mut self.outputs[port_id]
    }

    /// Sockets on one side of the node
    pub fn ports(&self, direction: PortDirection) -> &[Port] {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    pub fn port(&self, direction: PortDirection, port: PortId) -> Option<&Port> {
        self.ports(direction).get(port)
    }

    pub fn port_mut(&mut self, direction: PortDirection, port: PortId) -> Option<&mut Port> {
        match direction {
            PortDirection::Input => self.inputs.get_mut(port),
            PortDirection::Output => self.outputs.get_mut(port),
        }
    }

    /// Find a socket index by name
    pub fn port_index(&self, direction: PortDirection, name: &str) -> Option<PortId> {
        self.ports(direction).iter().position(|p| p.name == name)
    }

    /// The control-flow input, if any
    pub fn exec_input(&self) -> Option<PortId> {
        self.inputs.iter().position(Port::is_exec)
    }

    /// The control-flow output, if any
    pub fn exec_output(&self) -> Option<PortId> {
        self.outputs.iter().position(Port::is_exec)
    }

    pub fn parameter(&self, name: &str) -> Option<&NodeData> {
        self.parameters.get(name)
    }
}
