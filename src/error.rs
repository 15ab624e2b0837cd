//! Error types for the build graph core.
//!
//! Errors are split by concern so callers can tell apart:
//!
//! - **`GraphError`**: structural edits that were rejected. The graph is never
//!   partially modified when one of these is returned.
//! - **`ExecutionError`**: a build run halted. Side effects already applied to
//!   the host scene by earlier nodes stay applied.
//! - **`NodeError`**: failures raised from inside a node behavior. The engine
//!   wraps them in `ExecutionError::NodeExecution`.
//! - **`SnapshotError`** / **`HistoryError`**: a snapshot could not be turned
//!   back into a graph. History leaves its cursor where it was.
//! - **`FileError`** / **`ConfigError`**: persistence problems.
//! - **`EditorError`**: everything the editor session can surface.

use thiserror::Error;

use crate::nodes::data_type::DataType;
use crate::nodes::graph::Connection;
use crate::nodes::node::NodeId;
use crate::nodes::port::{PortDirection, PortId};

/// Errors raised by structural graph edits and node type registration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("node type {node_type} is unique and node {existing} already exists")]
    DuplicateUniqueNode { node_type: String, existing: NodeId },

    #[error("invalid definition for node type {node_type}: {reason}")]
    InvalidNodeDefinition { node_type: String, reason: String },

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("port not found: node {node}, {direction} port {port}")]
    PortNotFound {
        node: NodeId,
        port: PortId,
        direction: PortDirection,
    },

    #[error("no {direction} socket named '{name}' on node {node}")]
    NamedPortNotFound {
        node: NodeId,
        name: String,
        direction: PortDirection,
    },

    #[error("socket on node {node} is an {actual} socket, expected {expected}")]
    WrongDirection {
        node: NodeId,
        expected: PortDirection,
        actual: PortDirection,
    },

    #[error("cannot connect {output} output to {input} input")]
    IncompatibleSocket { output: DataType, input: DataType },

    #[error("socket belongs to a different graph")]
    CrossGraph,

    #[error("connecting node {from} to node {to} would create a cycle")]
    CycleDetected { from: NodeId, to: NodeId },

    #[error("value of type {got} does not fit {expected} socket {port} on node {node}")]
    IncompatibleValue {
        node: NodeId,
        port: PortId,
        expected: DataType,
        got: DataType,
    },

    #[error("{0} holds a non-finite number, which a graph file cannot store")]
    NonFiniteValue(String),
}

/// Error reported by the host scene collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("host command '{command}' failed: {message}")]
pub struct HostError {
    pub command: String,
    pub message: String,
}

impl HostError {
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// Errors raised from inside a node behavior.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    #[error("input '{0}' has no value")]
    MissingInput(String),

    #[error("input '{name}' is invalid: {reason}")]
    InvalidInput { name: String, reason: String },

    #[error("node has no output named '{0}'")]
    UnknownOutput(String),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("{0}")]
    Failed(String),
}

/// Errors that halt a build run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("graph has no entry node")]
    NoEntryNode,

    #[error("graph has multiple entry nodes: {0:?}")]
    MultipleEntryNodes(Vec<NodeId>),

    #[error("exec chain revisits node {0}")]
    ExecutionCycle(NodeId),

    #[error("node {node} ({title}) has no value for required input '{socket}'")]
    MissingRequiredInput {
        node: NodeId,
        title: String,
        socket: String,
    },

    #[error("node {node} ({title}) failed: {cause}")]
    NodeExecution {
        node: NodeId,
        title: String,
        #[source]
        cause: NodeError,
    },

    #[error("input '{socket}' of node {node} ({title}) pulls from an exec node that has not run yet")]
    UpstreamNotExecuted {
        node: NodeId,
        title: String,
        socket: String,
    },

    #[error("input '{socket}' of node {node} expected {expected}, got {got}")]
    TypeMismatch {
        node: NodeId,
        socket: String,
        expected: DataType,
        got: DataType,
    },

    #[error("node {node} has unregistered type {node_type}")]
    UnknownNodeType { node: NodeId, node_type: String },

    #[error("build cancelled")]
    Cancelled,
}

/// Errors raised while rebuilding a graph from a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is inconsistent: {0}")]
    Graph(#[from] GraphError),

    #[error("node {node} of type {node_type} does not match the registered socket layout")]
    SocketLayoutMismatch { node: NodeId, node_type: String },

    #[error("connection {0:?} conflicts with another connection in the snapshot")]
    ConflictingConnection(Connection),

    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the history engine.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("cannot restore history stamp: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Errors raised while saving or loading graph files.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse graph file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported graph file version {0}")]
    UnsupportedVersion(String),

    #[error("no file path set, use save_as instead")]
    NoFilePath,
}

/// Errors raised while loading the editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced by the editor session.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    File(#[from] FileError),
}
