//! Node graph data structures and operations
//!
//! The graph owns its nodes and connections and enforces the structural
//! invariants: every connection joins two existing sockets of compatible kinds,
//! an input has at most one incoming connection, an exec output has at most
//! one successor, and data connections never form a cycle. Every rejected
//! edit leaves the graph untouched. The graph does not record history.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GraphError;
use crate::nodes::data_type::is_compatible;
use crate::nodes::factory::NodeRegistry;
use crate::nodes::interface::NodeData;
use crate::nodes::node::{Node, NodeId};
use crate::nodes::port::{Port, PortDirection, PortId, SocketRef};

/// Identity of a live graph instance
pub type GraphId = Uuid;

/// Represents a connection from an output socket to an input socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connection {
    pub from_node: NodeId,
    pub from_port: PortId,
    pub to_node: NodeId,
    pub to_port: PortId,
}

impl Connection {
    /// Creates a new connection
    pub fn new(from_node: NodeId, from_port: PortId, to_node: NodeId, to_port: PortId) -> Self {
        Self {
            from_node,
            from_port,
            to_node,
            to_port,
        }
    }

    /// Check whether either endpoint belongs to the node
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }
}

/// Selected nodes and connections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub nodes: BTreeSet<NodeId>,
    pub connections: BTreeSet<Connection>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }
}

/// Per-node overrides applied when a node is added
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub title: Option<String>,
    pub parameters: BTreeMap<String, NodeData>,
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: NodeData) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }
}

/// A build graph containing nodes and their connections
#[derive(Debug, Clone)]
pub struct NodeGraph {
    id: GraphId,
    nodes: HashMap<NodeId, Node>,
    connections: Vec<Connection>,
    selection: Selection,
    variables: BTreeMap<String, NodeData>,
    modified: bool,
    next_node_id: NodeId,
}

impl NodeGraph {
    /// Creates a new empty node graph
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            nodes: HashMap::new(),
            connections: Vec::new(),
            selection: Selection::default(),
            variables: BTreeMap::new(),
            modified: false,
            next_node_id: 0,
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Adds a node of a registered type and returns its ID
    pub fn add_node(
        &mut self,
        registry: &NodeRegistry,
        type_id: &str,
        config: NodeConfig,
    ) -> Result<NodeId, GraphError> {
        let metadata = registry
            .get_metadata(type_id)
            .ok_or_else(|| GraphError::UnknownNodeType(type_id.to_string()))?;

        if metadata.unique {
            if let Some(existing) = self.find_nodes_of_type(type_id).first() {
                return Err(GraphError::DuplicateUniqueNode {
                    node_type: type_id.to_string(),
                    existing: *existing,
                });
            }
        }

        for (name, value) in &config.parameters {
            ensure_finite(value, || format!("parameter '{}'", name))?;
        }

        let id = self.next_node_id;
        let mut node = metadata.instantiate(id);
        if let Some(title) = config.title {
            node.title = title;
        }
        node.parameters.extend(config.parameters);

        debug!("Adding node {} ({}) to graph", id, type_id);
        self.nodes.insert(id, node);
        self.next_node_id += 1;
        Ok(id)
    }

    /// Inserts a node that already carries its ID (used when rebuilding from a snapshot)
    pub(crate) fn insert_node_with_id(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::InvalidNodeDefinition {
                node_type: node.type_id.clone(),
                reason: format!("node id {} is used twice", node.id),
            });
        }
        if node.unique {
            if let Some(existing) = self.find_nodes_of_type(&node.type_id).first() {
                return Err(GraphError::DuplicateUniqueNode {
                    node_type: node.type_id.clone(),
                    existing: *existing,
                });
            }
        }
        // Update next_node_id to avoid conflicts
        if node.id >= self.next_node_id {
            self.next_node_id = node.id + 1;
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Removes a node and all its connections; absent IDs are ignored
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&node_id)?;
        self.connections.retain(|conn| !conn.touches(node_id));
        self.selection.nodes.remove(&node_id);
        self.selection.connections.retain(|conn| !conn.touches(node_id));
        debug!("Removed node {} ({})", node_id, node.type_id);
        Some(node)
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Iterate nodes in ID order
    pub fn nodes_iter(&self) -> impl Iterator<Item = &Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_by_key(|node| node.id);
        nodes.into_iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// IDs of all nodes of a type, sorted
    pub fn find_nodes_of_type(&self, type_id: &str) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| node.type_id == type_id)
            .map(|node| node.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The connection feeding an input socket, if any
    pub fn connection_into(&self, node_id: NodeId, port: PortId) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.to_node == node_id && c.to_port == port)
    }

    /// All connections leaving an output socket
    pub fn connections_from(
        &self,
        node_id: NodeId,
        port: PortId,
    ) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(move |c| c.from_node == node_id && c.from_port == port)
    }

    /// Address an input socket by name
    pub fn input(&self, node_id: NodeId, name: &str) -> Result<SocketRef, GraphError> {
        self.socket_by_name(node_id, name, PortDirection::Input)
    }

    /// Address an output socket by name
    pub fn output(&self, node_id: NodeId, name: &str) -> Result<SocketRef, GraphError> {
        self.socket_by_name(node_id, name, PortDirection::Output)
    }

    /// Address an input socket by index
    pub fn input_at(&self, node_id: NodeId, port: PortId) -> Result<SocketRef, GraphError> {
        self.socket_at(node_id, port, PortDirection::Input)
    }

    /// Address an output socket by index
    pub fn output_at(&self, node_id: NodeId, port: PortId) -> Result<SocketRef, GraphError> {
        self.socket_at(node_id, port, PortDirection::Output)
    }

    fn socket_by_name(
        &self,
        node_id: NodeId,
        name: &str,
        direction: PortDirection,
    ) -> Result<SocketRef, GraphError> {
        let node = self.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        let port = node
            .port_index(direction, name)
            .ok_or_else(|| GraphError::NamedPortNotFound {
                node: node_id,
                name: name.to_string(),
                direction,
            })?;
        Ok(SocketRef {
            graph: self.id,
            node: node_id,
            port,
            direction,
        })
    }

    fn socket_at(
        &self,
        node_id: NodeId,
        port: PortId,
        direction: PortDirection,
    ) -> Result<SocketRef, GraphError> {
        self.resolve(&SocketRef {
            graph: self.id,
            node: node_id,
            port,
            direction,
        })?;
        Ok(SocketRef {
            graph: self.id,
            node: node_id,
            port,
            direction,
        })
    }

    /// Look up the socket a reference points at
    pub fn resolve(&self, socket: &SocketRef) -> Result<&Port, GraphError> {
        if socket.graph != self.id {
            return Err(GraphError::CrossGraph);
        }
        let node = self
            .node(socket.node)
            .ok_or(GraphError::NodeNotFound(socket.node))?;
        node.port(socket.direction, socket.port)
            .ok_or(GraphError::PortNotFound {
                node: socket.node,
                port: socket.port,
                direction: socket.direction,
            })
    }

    /// Connects an output socket to an input socket.
    ///
    /// An existing connection into the input is replaced, as is the existing
    /// successor of an exec output.
    pub fn connect(
        &mut self,
        output: SocketRef,
        input: SocketRef,
    ) -> Result<Connection, GraphError> {
        if output.graph != self.id || input.graph != self.id {
            return Err(GraphError::CrossGraph);
        }
        if output.direction != PortDirection::Output {
            return Err(GraphError::WrongDirection {
                node: output.node,
                expected: PortDirection::Output,
                actual: output.direction,
            });
        }
        if input.direction != PortDirection::Input {
            return Err(GraphError::WrongDirection {
                node: input.node,
                expected: PortDirection::Input,
                actual: input.direction,
            });
        }

        let from = self.resolve(&output)?;
        let to = self.resolve(&input)?;
        if !is_compatible(&from.data_type, &to.data_type) {
            return Err(GraphError::IncompatibleSocket {
                output: from.data_type.clone(),
                input: to.data_type.clone(),
            });
        }
        let exec = from.is_exec();
        if !exec && self.data_path_exists(input.node, output.node) {
            return Err(GraphError::CycleDetected {
                from: output.node,
                to: input.node,
            });
        }

        let connection = Connection::new(output.node, output.port, input.node, input.port);
        let replaced = self.connections.len();
        self.connections.retain(|c| {
            let same_input = c.to_node == input.node && c.to_port == input.port;
            let same_exec_output =
                exec && c.from_node == output.node && c.from_port == output.port;
            !(same_input || same_exec_output)
        });
        if self.connections.len() != replaced {
            debug!("Connection into node {} replaced", input.node);
            let live = &self.connections;
            self.selection.connections.retain(|c| live.contains(c));
        }
        self.connections.push(connection);
        debug!(
            "Connected node {} port {} -> node {} port {}",
            connection.from_node, connection.from_port, connection.to_node, connection.to_port
        );
        Ok(connection)
    }

    /// Check whether `target` is reachable from `start` along data connections
    fn data_path_exists(&self, start: NodeId, target: NodeId) -> bool {
        let mut stack = vec![start];
        let mut seen = HashSet::new();
        while let Some(node_id) = stack.pop() {
            if node_id == target {
                return true;
            }
            if !seen.insert(node_id) {
                continue;
            }
            for conn in self.connections.iter().filter(|c| c.from_node == node_id) {
                let is_data = self
                    .node(conn.from_node)
                    .and_then(|n| n.port(PortDirection::Output, conn.from_port))
                    .map(|p| !p.is_exec())
                    .unwrap_or(false);
                if is_data {
                    stack.push(conn.to_node);
                }
            }
        }
        false
    }

    /// Removes a connection, returning whether it existed
    pub fn disconnect(&mut self, connection: &Connection) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c != connection);
        self.selection.connections.remove(connection);
        self.connections.len() != before
    }

    /// Changes a node's display title
    pub fn rename_node(&mut self, node_id: NodeId, title: impl Into<String>) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.title = title.into();
        Ok(())
    }

    /// Sets or clears the literal of an input socket
    pub fn set_socket_value(
        &mut self,
        socket: SocketRef,
        value: Option<NodeData>,
    ) -> Result<(), GraphError> {
        if socket.direction != PortDirection::Input {
            return Err(GraphError::WrongDirection {
                node: socket.node,
                expected: PortDirection::Input,
                actual: socket.direction,
            });
        }
        let port = self.resolve(&socket)?;
        let value = match value {
            Some(value) => {
                let value = port.data_type.coerce(value).map_err(|got| {
                    GraphError::IncompatibleValue {
                        node: socket.node,
                        port: socket.port,
                        expected: port.data_type.clone(),
                        got,
                    }
                })?;
                ensure_finite(&value, || {
                    format!("input '{}' of node {}", port.name, socket.node)
                })?;
                Some(value)
            }
            None => None,
        };

        if let Some(port) = self
            .nodes
            .get_mut(&socket.node)
            .and_then(|n| n.port_mut(PortDirection::Input, socket.port))
        {
            port.value = value;
        }
        Ok(())
    }

    /// Sets a node-local parameter
    pub fn set_parameter(
        &mut self,
        node_id: NodeId,
        name: impl Into<String>,
        value: NodeData,
    ) -> Result<(), GraphError> {
        let name = name.into();
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        ensure_finite(&value, || format!("parameter '{}' of node {}", name, node_id))?;
        node.parameters.insert(name, value);
        Ok(())
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: NodeData) -> Result<(), GraphError> {
        let name = name.into();
        ensure_finite(&value, || format!("variable '{}'", name))?;
        self.variables.insert(name, value);
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&NodeData> {
        self.variables.get(name)
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<NodeData> {
        self.variables.remove(name)
    }

    pub fn variables(&self) -> &BTreeMap<String, NodeData> {
        &self.variables
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select_node(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        if !self.contains_node(node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }
        self.selection.nodes.insert(node_id);
        Ok(())
    }

    /// Selects a connection, returning false if it is not in the graph
    pub fn select_connection(&mut self, connection: Connection) -> bool {
        if !self.connections.contains(&connection) {
            return false;
        }
        self.selection.connections.insert(connection);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Replaces the selection, dropping entries that are not in the graph
    pub fn set_selection(&mut self, selection: &Selection) {
        self.selection.nodes = selection
            .nodes
            .iter()
            .copied()
            .filter(|id| self.nodes.contains_key(id))
            .collect();
        self.selection.connections = selection
            .connections
            .iter()
            .copied()
            .filter(|c| self.connections.contains(c))
            .collect();
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Next ID that will be handed out
    pub fn next_node_id(&self) -> NodeId {
        self.next_node_id
    }

    /// Takes over the contents of another graph while keeping this graph's identity.
    ///
    /// The ID counter never moves backwards, so IDs handed out before the
    /// replacement are not reused.
    pub fn replace_contents(&mut self, other: NodeGraph) {
        let next_node_id = self.next_node_id.max(other.next_node_id);
        self.nodes = other.nodes;
        self.connections = other.connections;
        self.selection = other.selection;
        self.variables = other.variables;
        self.modified = other.modified;
        self.next_node_id = next_node_id;
    }

    pub(crate) fn set_next_node_id(&mut self, next_node_id: NodeId) {
        self.next_node_id = self.next_node_id.max(next_node_id);
    }

    /// Compare nodes, connections, socket values and variables, ignoring
    /// graph identity, storage order and selection
    pub fn structurally_eq(&self, other: &NodeGraph) -> bool {
        crate::nodes::serial::serialize(self).structure_eq(&crate::nodes::serial::serialize(other))
    }
}

/// Refuse values a graph file cannot represent
pub(crate) fn ensure_finite(
    value: &NodeData,
    location: impl FnOnce() -> String,
) -> Result<(), GraphError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GraphError::NonFiniteValue(location()))
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}
