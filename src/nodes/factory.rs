//! Node factory system with registration and rich metadata
//!
//! External code plugs node types into the build graph here: a type
//! identifier maps to a socket layout plus a behavior function.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, NodeError};
use crate::nodes::data_type::DataType;
use crate::nodes::execution_engine::NodeContext;
use crate::nodes::interface::NodeData;
use crate::nodes::node::{Node, NodeId};

/// Hierarchical category system for organizing nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeCategory {
    path: Vec<String>,
}

impl NodeCategory {
    /// Create a new category from path components
    pub fn new(path: &[&str]) -> Self {
        Self {
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Path joined for display, e.g. `Data > Source`
    pub fn display_string(&self) -> String {
        self.path.join(" > ")
    }
}

// Standard categories
impl NodeCategory {
    pub fn flow() -> Self { Self::new(&["Flow"]) }
    pub fn math() -> Self { Self::new(&["Math"]) }
    pub fn data() -> Self { Self::new(&["Data"]) }
    pub fn output() -> Self { Self::new(&["Output"]) }
}

/// Port definition for node creation
#[derive(Debug, Clone, PartialEq)]
pub struct PortDefinition {
    pub name: String,
    pub data_type: DataType,
    pub optional: bool,
    pub default: Option<NodeData>,
}

impl PortDefinition {
    /// Create a required port
    pub fn required(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            optional: false,
            default: None,
        }
    }

    /// Create an optional port
    pub fn optional(name: &str, data_type: DataType) -> Self {
        Self {
            optional: true,
            ..Self::required(name, data_type)
        }
    }

    /// Control-flow port
    pub fn exec() -> Self {
        Self::optional("Exec", DataType::Exec)
    }

    /// Literal used while the socket is unconnected
    pub fn with_default(mut self, value: NodeData) -> Self {
        self.default = Some(value);
        self
    }
}

/// Behavior invoked when a node is executed or pulled
pub type NodeBehavior = fn(&mut NodeContext<'_>) -> Result<(), NodeError>;

/// Metadata for nodes - the single source of truth for their layout
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    // Core identity
    pub node_type: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: NodeCategory,

    // Connectivity
    pub inputs: Vec<PortDefinition>,
    pub outputs: Vec<PortDefinition>,

    // Execution behavior
    pub is_exec: bool,
    pub unique: bool,
    pub entry_point: bool,

    /// Initial node-local configuration
    pub parameters: Vec<(&'static str, NodeData)>,
}

impl NodeMetadata {
    /// Create node metadata for a pure data node
    pub fn new(
        node_type: &'static str,
        display_name: &'static str,
        category: NodeCategory,
        description: &'static str,
    ) -> Self {
        Self {
            node_type,
            display_name,
            description,
            category,
            inputs: vec![],
            outputs: vec![],
            is_exec: false,
            unique: false,
            entry_point: false,
            parameters: vec![],
        }
    }

    /// Create metadata for a step in the exec chain (one exec input, one exec output)
    pub fn exec_step(
        node_type: &'static str,
        display_name: &'static str,
        category: NodeCategory,
        description: &'static str,
    ) -> Self {
        let mut meta = Self::new(node_type, display_name, category, description);
        meta.is_exec = true;
        meta.inputs.push(PortDefinition::exec());
        meta.outputs.push(PortDefinition::exec());
        meta
    }

    /// Create metadata for the graph's entry node
    pub fn entry(
        node_type: &'static str,
        display_name: &'static str,
        category: NodeCategory,
        description: &'static str,
    ) -> Self {
        let mut meta = Self::new(node_type, display_name, category, description);
        meta.is_exec = true;
        meta.unique = true;
        meta.entry_point = true;
        meta.outputs.push(PortDefinition::exec());
        meta
    }

    /// Appends input definitions
    pub fn with_inputs(mut self, inputs: Vec<PortDefinition>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    /// Appends output definitions
    pub fn with_outputs(mut self, outputs: Vec<PortDefinition>) -> Self {
        self.outputs.extend(outputs);
        self
    }

    pub fn with_parameter(mut self, name: &'static str, value: NodeData) -> Self {
        self.parameters.push((name, value));
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Check the structural rules every node type must follow
    pub fn validate(&self) -> Result<(), GraphError> {
        let invalid = |reason: &str| GraphError::InvalidNodeDefinition {
            node_type: self.node_type.to_string(),
            reason: reason.to_string(),
        };

        let exec_inputs = self.inputs.iter().filter(|p| p.data_type.is_exec()).count();
        let exec_outputs = self.outputs.iter().filter(|p| p.data_type.is_exec()).count();

        if self.is_exec {
            if exec_inputs > 1 || exec_outputs > 1 {
                return Err(invalid("exec nodes have at most one exec input and one exec output"));
            }
        } else if exec_inputs + exec_outputs > 0 {
            return Err(invalid("only exec nodes may declare exec sockets"));
        }
        if self.entry_point && !(self.is_exec && self.unique) {
            return Err(invalid("entry nodes must be unique exec nodes"));
        }
        for port in self.inputs.iter().chain(&self.outputs) {
            if let Some(default) = &port.default {
                if !port.data_type.accepts(default) {
                    return Err(invalid(&format!(
                        "default of port '{}' is not a {}",
                        port.name, port.data_type
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build a node instance with the declared sockets and parameters
    pub fn instantiate(&self, id: NodeId) -> Node {
        let mut node = Node::new(id, self.node_type, self.display_name);
        node.category = self.category.clone();
        node.is_exec = self.is_exec;
        node.unique = self.unique;

        for input in &self.inputs {
            let port = node.add_input(&input.name, input.data_type.clone());
            port.required = !input.optional && !input.data_type.is_exec();
            port.value = input.default.clone();
        }
        for output in &self.outputs {
            node.add_output(&output.name, output.data_type.clone());
        }
        for (name, value) in &self.parameters {
            node.parameters.insert(name.to_string(), value.clone());
        }
        node
    }
}

/// Node factory trait: metadata plus behavior
pub trait NodeFactory {
    /// Get comprehensive node metadata
    fn metadata() -> NodeMetadata
    where
        Self: Sized;

    /// Run the node's behavior
    fn execute(ctx: &mut NodeContext<'_>) -> Result<(), NodeError>
    where
        Self: Sized;

    /// Create a node instance with the given id
    fn create(id: NodeId) -> Node
    where
        Self: Sized,
    {
        Self::metadata().instantiate(id)
    }
}

/// A registered node type
#[derive(Clone)]
struct RegisteredNode {
    metadata: NodeMetadata,
    behavior: NodeBehavior,
}

/// Registry for managing node types
#[derive(Clone, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<String, RegisteredNode>,
    categories: HashMap<NodeCategory, Vec<String>>,
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("node_types", &self.node_types())
            .finish()
    }
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the builtin node catalogue
    pub fn with_builtin_nodes() -> Result<Self, GraphError> {
        let mut registry = Self::new();
        crate::nodes::register_builtin_nodes(&mut registry)?;
        Ok(registry)
    }

    /// Register a node factory
    pub fn register<T: NodeFactory + 'static>(&mut self) -> Result<(), GraphError> {
        self.register_fn(T::metadata(), T::execute)
    }

    /// Register a node type from metadata and a behavior function
    pub fn register_fn(
        &mut self,
        metadata: NodeMetadata,
        behavior: NodeBehavior,
    ) -> Result<(), GraphError> {
        metadata.validate()?;
        let node_type = metadata.node_type.to_string();
        if self.nodes.contains_key(&node_type) {
            warn!("Node type {} is already registered", node_type);
            return Err(GraphError::InvalidNodeDefinition {
                node_type,
                reason: "type is already registered".to_string(),
            });
        }

        debug!("Registering node type {}", node_type);
        self.categories
            .entry(metadata.category.clone())
            .or_default()
            .push(node_type.clone());
        self.nodes
            .insert(node_type, RegisteredNode { metadata, behavior });
        Ok(())
    }

    /// Create a node by type name
    pub fn create_node(&self, node_type: &str, id: NodeId) -> Result<Node, GraphError> {
        self.nodes
            .get(node_type)
            .map(|registered| registered.metadata.instantiate(id))
            .ok_or_else(|| GraphError::UnknownNodeType(node_type.to_string()))
    }

    /// Get metadata for a node type without creating the node
    pub fn get_metadata(&self, node_type: &str) -> Option<&NodeMetadata> {
        self.nodes.get(node_type).map(|r| &r.metadata)
    }

    /// Get the behavior registered for a node type
    pub fn behavior(&self, node_type: &str) -> Option<NodeBehavior> {
        self.nodes.get(node_type).map(|r| r.behavior)
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.nodes.contains_key(node_type)
    }

    /// Check whether a node type marks the graph entry point
    pub fn is_entry_point(&self, node_type: &str) -> bool {
        self.get_metadata(node_type)
            .map(|meta| meta.entry_point)
            .unwrap_or(false)
    }

    /// All registered node types, sorted
    pub fn node_types(&self) -> Vec<&str> {
        self.nodes.keys().map(|k| k.as_str()).collect()
    }

    /// Node types in a category
    pub fn nodes_in_category(&self, category: &NodeCategory) -> Vec<&str> {
        self.categories
            .get(category)
            .map(|types| types.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// All categories with at least one node type
    pub fn categories(&self) -> Vec<&NodeCategory> {
        let mut categories: Vec<_> = self.categories.keys().collect();
        categories.sort();
        categories
    }
}
