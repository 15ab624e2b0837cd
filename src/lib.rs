//! rigflow core library
//!
//! A node-graph build system: typed sockets, a graph model that enforces its
//! connection invariants, an engine that walks the exec chain and pulls data
//! inputs on demand, and snapshot-based undo/redo.

pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod history;
pub mod host;
pub mod nodes;

// Re-export commonly used types
pub use config::EditorConfig;
pub use editor::{FileManager, NodeEditor};
pub use error::{
    ConfigError, EditorError, ExecutionError, FileError, GraphError, HistoryError, HostError,
    NodeError, SnapshotError,
};
pub use history::{GraphHistory, HistoryStamp};
pub use host::{HostScene, RecordingScene};
pub use nodes::{
    Connection, DataType, ExecutionReport, ExecutionState, GraphSnapshot, NodeConfig, NodeData,
    NodeGraph, NodeGraphEngine, NodeId, NodeRegistry,
};
