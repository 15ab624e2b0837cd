//! Build graph editor session
//!
//! [`NodeEditor`] is the command layer on top of the graph model. Every
//! command that changes the graph records one history stamp when it succeeds
//! and none when it fails.

pub mod file_manager;

pub use file_manager::FileManager;

use std::path::Path;

use log::{debug, info};

use crate::config::EditorConfig;
use crate::error::{EditorError, GraphError};
use crate::history::GraphHistory;
use crate::host::HostScene;
use crate::nodes::execution_engine::{CancellationToken, ExecutionReport, NodeGraphEngine};
use crate::nodes::factory::NodeRegistry;
use crate::nodes::graph::{Connection, NodeConfig, NodeGraph};
use crate::nodes::hooks::LoggingHooks;
use crate::nodes::interface::NodeData;
use crate::nodes::node::NodeId;
use crate::nodes::port::SocketRef;
use crate::nodes::serial::deserialize;

/// Main application state for the build graph editor
pub struct NodeEditor {
    registry: NodeRegistry,
    graph: NodeGraph,
    history: GraphHistory,
    engine: NodeGraphEngine,
    file_manager: FileManager,
    config: EditorConfig,
}

impl NodeEditor {
    /// Editor with the builtin node catalogue
    pub fn new(config: EditorConfig) -> Result<Self, EditorError> {
        Ok(Self::with_registry(NodeRegistry::with_builtin_nodes()?, config))
    }

    pub fn with_registry(registry: NodeRegistry, config: EditorConfig) -> Self {
        let mut graph = NodeGraph::new();
        let mut history = GraphHistory::new(config.history_capacity);
        history.store_initial(&mut graph);
        let mut engine = NodeGraphEngine::new();
        engine.add_hooks(Box::new(LoggingHooks));
        Self {
            registry,
            graph,
            history,
            engine,
            file_manager: FileManager::new(),
            config,
        }
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Registry access for plugging in more node types
    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    pub fn history(&self) -> &GraphHistory {
        &self.history
    }

    pub fn engine(&self) -> &NodeGraphEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut NodeGraphEngine {
        &mut self.engine
    }

    pub fn file_manager(&self) -> &FileManager {
        &self.file_manager
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// File name with a `*` when there are unsaved changes
    pub fn title(&self) -> String {
        self.file_manager.get_file_display_name(self.graph.is_modified())
    }

    pub fn is_modified(&self) -> bool {
        self.graph.is_modified()
    }

    fn record(&mut self, description: String) {
        debug!("{}", description);
        self.history.store(&mut self.graph, description, true);
    }

    /// Start an empty graph with fresh history
    pub fn new_graph(&mut self) {
        self.graph = NodeGraph::new();
        self.history.store_initial(&mut self.graph);
        self.file_manager.new_file();
        info!("Created new graph");
    }

    /// Replace the session with a graph read from disk
    pub fn open(&mut self, path: &Path) -> Result<(), EditorError> {
        let data = FileManager::read_save_data(path)?;
        let mut graph = deserialize(&data.graph, &self.registry)?;
        graph.set_modified(false);
        self.graph = graph;
        self.history.store_initial(&mut self.graph);
        self.file_manager.set_opened(path, data.metadata.created);
        Ok(())
    }

    pub fn save(&mut self) -> Result<(), EditorError> {
        self.file_manager.save_file(&self.graph)?;
        self.graph.set_modified(false);
        Ok(())
    }

    pub fn save_as(&mut self, path: &Path) -> Result<(), EditorError> {
        self.file_manager.save_to_file(path, &self.graph)?;
        self.graph.set_modified(false);
        Ok(())
    }

    pub fn add_node(&mut self, type_id: &str, config: NodeConfig) -> Result<NodeId, EditorError> {
        let id = self.graph.add_node(&self.registry, type_id, config)?;
        self.record(format!("Add node {} ({})", id, type_id));
        Ok(id)
    }

    /// Returns false if the node did not exist
    pub fn remove_node(&mut self, node_id: NodeId) -> bool {
        match self.graph.remove_node(node_id) {
            Some(node) => {
                self.record(format!("Remove node {} ({})", node_id, node.title));
                true
            }
            None => false,
        }
    }

    /// Remove selected connections and nodes as one step
    pub fn delete_selected(&mut self) -> usize {
        let selection = self.graph.selection().clone();
        let mut removed = 0;
        for connection in &selection.connections {
            if self.graph.disconnect(connection) {
                removed += 1;
            }
        }
        for node_id in &selection.nodes {
            if self.graph.remove_node(*node_id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            self.record(format!("Delete {} selected item(s)", removed));
        }
        removed
    }

    /// Connect sockets addressed by node and socket name
    pub fn connect(
        &mut self,
        from: NodeId,
        output: &str,
        to: NodeId,
        input: &str,
    ) -> Result<Connection, EditorError> {
        let output = self.graph.output(from, output)?;
        let input = self.graph.input(to, input)?;
        self.connect_sockets(output, input)
    }

    pub fn connect_sockets(
        &mut self,
        output: SocketRef,
        input: SocketRef,
    ) -> Result<Connection, EditorError> {
        let connection = self.graph.connect(output, input)?;
        self.record(format!(
            "Connect {}:{} -> {}:{}",
            connection.from_node, connection.from_port, connection.to_node, connection.to_port
        ));
        Ok(connection)
    }

    pub fn disconnect(&mut self, connection: &Connection) -> bool {
        let removed = self.graph.disconnect(connection);
        if removed {
            self.record(format!(
                "Disconnect {}:{} -> {}:{}",
                connection.from_node, connection.from_port, connection.to_node, connection.to_port
            ));
        }
        removed
    }

    /// Disconnect whatever feeds an input socket
    pub fn disconnect_input(&mut self, node_id: NodeId, input: &str) -> Result<bool, EditorError> {
        let socket = self.graph.input(node_id, input)?;
        let connection = self.graph.connection_into(socket.node, socket.port).copied();
        Ok(connection.map(|c| self.disconnect(&c)).unwrap_or(false))
    }

    pub fn rename_node(&mut self, node_id: NodeId, title: &str) -> Result<(), EditorError> {
        self.graph.rename_node(node_id, title)?;
        self.record(format!("Rename node {} to {}", node_id, title));
        Ok(())
    }

    pub fn set_socket_value(
        &mut self,
        node_id: NodeId,
        input: &str,
        value: Option<NodeData>,
    ) -> Result<(), EditorError> {
        let socket = self.graph.input(node_id, input)?;
        self.graph.set_socket_value(socket, value)?;
        self.record(format!("Set {} on node {}", input, node_id));
        Ok(())
    }

    pub fn set_parameter(
        &mut self,
        node_id: NodeId,
        name: &str,
        value: NodeData,
    ) -> Result<(), EditorError> {
        self.graph.set_parameter(node_id, name, value)?;
        self.record(format!("Set parameter {} on node {}", name, node_id));
        Ok(())
    }

    pub fn set_variable(&mut self, name: &str, value: NodeData) -> Result<(), EditorError> {
        self.graph.set_variable(name, value)?;
        self.record(format!("Set variable {}", name));
        Ok(())
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<NodeData> {
        let removed = self.graph.remove_variable(name)?;
        self.record(format!("Remove variable {}", name));
        Some(removed)
    }

    /// Selection is stored with the next stamp, not recorded on its own
    pub fn select_node(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        self.graph.select_node(node_id)
    }

    pub fn select_connection(&mut self, connection: Connection) -> bool {
        self.graph.select_connection(connection)
    }

    pub fn clear_selection(&mut self) {
        self.graph.clear_selection();
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        Ok(self.history.undo(&mut self.graph, &self.registry)?)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        Ok(self.history.redo(&mut self.graph, &self.registry)?)
    }

    /// Run the build against a host scene
    pub fn run(&mut self, scene: &mut dyn HostScene) -> Result<ExecutionReport, EditorError> {
        Ok(self.engine.run(&self.graph, &self.registry, scene)?)
    }

    pub fn run_with_cancel(
        &mut self,
        scene: &mut dyn HostScene,
        cancel: &CancellationToken,
    ) -> Result<ExecutionReport, EditorError> {
        Ok(self
            .engine
            .run_with_cancel(&self.graph, &self.registry, scene, cancel)?)
    }
}
