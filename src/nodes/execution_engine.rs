//! Node graph execution engine
//!
//! A build run starts at the graph's single entry node and follows the exec
//! chain one node at a time. Before a node's behavior runs, each of its data
//! inputs is resolved by pull evaluation:
//! - connected inputs evaluate the upstream producer (once per run, memoized
//!   per output socket in a [`RunCache`])
//! - unconnected inputs fall back to the socket literal
//! - a required input with neither halts the run
//!
//! Nothing is rolled back when a run halts. Side effects already applied to
//! the host scene stay applied.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::error::{ExecutionError, NodeError};
use crate::host::HostScene;
use crate::nodes::cache::{CacheKey, CacheStatistics, RunCache};
use crate::nodes::factory::NodeRegistry;
use crate::nodes::graph::{Connection, NodeGraph};
use crate::nodes::hooks::NodeExecutionHooks;
use crate::nodes::interface::NodeData;
use crate::nodes::node::{Node, NodeId};
use crate::nodes::port::{Port, PortId};

/// Lifecycle of the engine's most recent run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Flag checked between exec-chain steps
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect before the next exec step
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Exec nodes in the order they ran
    pub executed: Vec<NodeId>,
    /// Data nodes in the order they were first pulled
    pub evaluated: Vec<NodeId>,
    pub cache: CacheStatistics,
    pub elapsed: Duration,
}

/// Everything a node behavior sees while it runs
pub struct NodeContext<'a> {
    node: &'a Node,
    inputs: Vec<Option<NodeData>>,
    outputs: Vec<(PortId, NodeData)>,
    variables: &'a BTreeMap<String, NodeData>,
    scene: &'a mut dyn HostScene,
}

impl<'a> NodeContext<'a> {
    /// Build a context from already resolved input values, one per input socket
    pub fn new(
        node: &'a Node,
        inputs: Vec<Option<NodeData>>,
        variables: &'a BTreeMap<String, NodeData>,
        scene: &'a mut dyn HostScene,
    ) -> Self {
        Self {
            node,
            inputs,
            outputs: Vec::new(),
            variables,
            scene,
        }
    }

    pub fn node(&self) -> &Node {
        self.node
    }

    /// Resolved value of an input, if it has one
    pub fn input(&self, name: &str) -> Option<&NodeData> {
        let index = self.node.inputs.iter().position(|p| p.name == name)?;
        self.inputs.get(index)?.as_ref()
    }

    /// Resolved value of an input that must be present
    pub fn require(&self, name: &str) -> Result<&NodeData, NodeError> {
        self.input(name)
            .ok_or_else(|| NodeError::MissingInput(name.to_string()))
    }

    pub fn input_number(&self, name: &str) -> Result<f64, NodeError> {
        let value = self.require(name)?;
        value.as_number().ok_or_else(|| NodeError::InvalidInput {
            name: name.to_string(),
            reason: format!("expected a number, got {}", value.data_type()),
        })
    }

    pub fn input_str(&self, name: &str) -> Result<&str, NodeError> {
        let value = self.require(name)?;
        value.as_str().ok_or_else(|| NodeError::InvalidInput {
            name: name.to_string(),
            reason: format!("expected a string, got {}", value.data_type()),
        })
    }

    /// Publish a value on a data output
    pub fn set_output(&mut self, name: &str, value: NodeData) -> Result<(), NodeError> {
        let port = self
            .node
            .outputs
            .iter()
            .find(|p| p.name == name && !p.is_exec())
            .ok_or_else(|| NodeError::UnknownOutput(name.to_string()))?;
        let value = port.data_type.coerce(value).map_err(|got| {
            NodeError::Failed(format!(
                "output '{}' expects {}, got {}",
                name, port.data_type, got
            ))
        })?;

        self.outputs.retain(|(id, _)| *id != port.id);
        self.outputs.push((port.id, value));
        Ok(())
    }

    pub fn parameter(&self, name: &str) -> Option<&NodeData> {
        self.node.parameter(name)
    }

    /// Graph-level variable
    pub fn variable(&self, name: &str) -> Option<&NodeData> {
        self.variables.get(name)
    }

    pub fn scene(&mut self) -> &mut dyn HostScene {
        &mut *self.scene
    }

    /// Values published so far, keyed by output index
    pub fn outputs(&self) -> &[(PortId, NodeData)] {
        &self.outputs
    }

    fn into_outputs(self) -> Vec<(PortId, NodeData)> {
        self.outputs
    }
}

/// Execution engine for build graphs
pub struct NodeGraphEngine {
    state: ExecutionState,
    hooks: Vec<Box<dyn NodeExecutionHooks>>,
    last_error: Option<ExecutionError>,
}

impl NodeGraphEngine {
    pub fn new() -> Self {
        Self {
            state: ExecutionState::Idle,
            hooks: Vec::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// The error that ended the most recent run, if it failed
    pub fn last_error(&self) -> Option<&ExecutionError> {
        self.last_error.as_ref()
    }

    /// Register an observer for node lifecycle events
    pub fn add_hooks(&mut self, hooks: Box<dyn NodeExecutionHooks>) {
        self.hooks.push(hooks);
    }

    /// Return to `Idle` without running
    pub fn reset(&mut self) {
        self.state = ExecutionState::Idle;
        self.last_error = None;
    }

    /// Run the graph from its entry node to the end of the exec chain
    pub fn run(
        &mut self,
        graph: &NodeGraph,
        registry: &NodeRegistry,
        scene: &mut dyn HostScene,
    ) -> Result<ExecutionReport, ExecutionError> {
        self.run_with_cancel(graph, registry, scene, &CancellationToken::new())
    }

    /// Run the graph, checking `cancel` before each exec step
    pub fn run_with_cancel(
        &mut self,
        graph: &NodeGraph,
        registry: &NodeRegistry,
        scene: &mut dyn HostScene,
        cancel: &CancellationToken,
    ) -> Result<ExecutionReport, ExecutionError> {
        self.state = ExecutionState::Running;
        self.last_error = None;
        let started = Instant::now();

        let mut run = Run {
            graph,
            registry,
            hooks: &mut self.hooks,
            cache: RunCache::new(),
            report: ExecutionReport::default(),
        };
        let result = run.walk(scene, cancel);
        let mut report = run.finish();
        report.elapsed = started.elapsed();

        match result {
            Ok(()) => {
                info!(
                    "Build completed: {} exec node(s), {} data node(s) in {:?} (cache hit ratio {:.2})",
                    report.executed.len(),
                    report.evaluated.len(),
                    report.elapsed,
                    report.cache.hit_ratio()
                );
                self.state = ExecutionState::Completed;
                Ok(report)
            }
            Err(err) => {
                info!(
                    "Build halted after {} exec node(s): {}",
                    report.executed.len(),
                    err
                );
                self.state = ExecutionState::Failed;
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}

impl Default for NodeGraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// State of one run
struct Run<'a> {
    graph: &'a NodeGraph,
    registry: &'a NodeRegistry,
    hooks: &'a mut Vec<Box<dyn NodeExecutionHooks>>,
    cache: RunCache,
    report: ExecutionReport,
}

impl<'a> Run<'a> {
    fn finish(self) -> ExecutionReport {
        let mut report = self.report;
        report.cache = self.cache.get_statistics().clone();
        report
    }

    fn find_entry(&self) -> Result<&'a Node, ExecutionError> {
        let graph = self.graph;
        let entries: Vec<&Node> = graph
            .nodes_iter()
            .filter(|node| self.registry.is_entry_point(&node.type_id))
            .collect();
        match entries.as_slice() {
            [] => Err(ExecutionError::NoEntryNode),
            [entry] => Ok(*entry),
            _ => Err(ExecutionError::MultipleEntryNodes(
                entries.iter().map(|node| node.id).collect(),
            )),
        }
    }

    fn walk(
        &mut self,
        scene: &mut dyn HostScene,
        cancel: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        let graph = self.graph;
        let entry = self.find_entry()?;
        let mut visited = HashSet::new();
        let mut current = Some(entry);

        while let Some(node) = current {
            if cancel.is_cancelled() {
                warn!("Build cancelled before node {} ({})", node.id, node.title);
                return Err(ExecutionError::Cancelled);
            }
            if !visited.insert(node.id) {
                return Err(self.fail(node, ExecutionError::ExecutionCycle(node.id)));
            }

            self.invoke(node, scene)?;
            self.report.executed.push(node.id);

            current = node
                .exec_output()
                .and_then(|port| graph.connections_from(node.id, port).next())
                .and_then(|conn| graph.node(conn.to_node));
        }
        Ok(())
    }

    /// Resolve inputs and run one node's behavior
    fn invoke(&mut self, node: &'a Node, scene: &mut dyn HostScene) -> Result<(), ExecutionError> {
        let inputs = self.resolve_inputs(node, scene)?;
        let behavior = match self.registry.behavior(&node.type_id) {
            Some(behavior) => behavior,
            None => {
                let err = ExecutionError::UnknownNodeType {
                    node: node.id,
                    node_type: node.type_id.clone(),
                };
                return Err(self.fail(node, err));
            }
        };

        for hook in self.hooks.iter_mut() {
            hook.before_execution(node);
        }

        let graph = self.graph;
        let mut ctx = NodeContext::new(node, inputs, graph.variables(), &mut *scene);
        match behavior(&mut ctx) {
            Ok(()) => {
                let outputs = ctx.into_outputs();
                if !self.hooks.is_empty() {
                    let named: Vec<(String, NodeData)> = outputs
                        .iter()
                        .filter_map(|(port, value)| {
                            node.outputs
                                .get(*port)
                                .map(|p| (p.name.clone(), value.clone()))
                        })
                        .collect();
                    for hook in self.hooks.iter_mut() {
                        hook.after_execution(node, &named);
                    }
                }
                self.cache.store_outputs(node.id, outputs);
                Ok(())
            }
            Err(cause) => {
                let err = ExecutionError::NodeExecution {
                    node: node.id,
                    title: node.title.clone(),
                    cause,
                };
                Err(self.fail(node, err))
            }
        }
    }

    fn resolve_inputs(
        &mut self,
        node: &'a Node,
        scene: &mut dyn HostScene,
    ) -> Result<Vec<Option<NodeData>>, ExecutionError> {
        let graph = self.graph;
        let mut values = Vec::with_capacity(node.inputs.len());

        for port in &node.inputs {
            if port.is_exec() {
                values.push(None);
                continue;
            }

            let pulled = match graph.connection_into(node.id, port.id) {
                Some(conn) => self.pull(node, port, *conn, scene)?,
                None => None,
            };

            let value = match pulled.or_else(|| port.value.clone()) {
                Some(value) => match port.data_type.coerce(value) {
                    Ok(value) => Some(value),
                    Err(got) => {
                        let err = ExecutionError::TypeMismatch {
                            node: node.id,
                            socket: port.name.clone(),
                            expected: port.data_type.clone(),
                            got,
                        };
                        return Err(self.fail(node, err));
                    }
                },
                None if port.required => {
                    let err = ExecutionError::MissingRequiredInput {
                        node: node.id,
                        title: node.title.clone(),
                        socket: port.name.clone(),
                    };
                    return Err(self.fail(node, err));
                }
                None => None,
            };
            values.push(value);
        }
        Ok(values)
    }

    /// Value flowing along a data connection, evaluating the producer if needed
    fn pull(
        &mut self,
        consumer: &'a Node,
        port: &Port,
        conn: Connection,
        scene: &mut dyn HostScene,
    ) -> Result<Option<NodeData>, ExecutionError> {
        let graph = self.graph;
        let key = CacheKey::new(conn.from_node, conn.from_port);
        if let Some(value) = self.cache.get(&key) {
            return Ok(Some(value.clone()));
        }

        let Some(producer) = graph.node(conn.from_node) else {
            return Ok(None);
        };
        if !self.cache.has_produced(producer.id) {
            if producer.is_exec {
                let err = ExecutionError::UpstreamNotExecuted {
                    node: consumer.id,
                    title: consumer.title.clone(),
                    socket: port.name.clone(),
                };
                return Err(self.fail(consumer, err));
            }
            self.invoke(producer, scene)?;
            self.report.evaluated.push(producer.id);
        }

        Ok(self.cache.peek(&key).cloned())
    }

    /// Log a failure at `node` and notify observers
    fn fail(&mut self, node: &Node, err: ExecutionError) -> ExecutionError {
        error!("Node {} ({}) failed: {}", node.id, node.title, err);
        for hook in self.hooks.iter_mut() {
            hook.on_failure(node, &err);
        }
        err
    }
}
