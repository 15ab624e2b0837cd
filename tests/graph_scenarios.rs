//! End-to-end scenarios through the public API: editing, building, undo/redo
//! and persistence of build graphs.

use rigflow::constants::node_types;
use rigflow::nodes::{deserialize, serialize};
use rigflow::{
    Connection, EditorConfig, EditorError, ExecutionError, GraphError, GraphHistory, NodeConfig,
    NodeData, NodeEditor, NodeGraph, NodeGraphEngine, NodeId, NodeRegistry, RecordingScene,
};
use tempfile::TempDir;

fn add(graph: &mut NodeGraph, registry: &NodeRegistry, node_type: &str) -> NodeId {
    graph.add_node(registry, node_type, NodeConfig::new()).unwrap()
}

fn connect(graph: &mut NodeGraph, from: NodeId, output: &str, to: NodeId, input: &str) -> Connection {
    let output = graph.output(from, output).unwrap();
    let input = graph.input(to, input).unwrap();
    graph.connect(output, input).unwrap()
}

/// Start -> Print("sum", Add(2, 3))
fn sum_graph(registry: &NodeRegistry) -> (NodeGraph, NodeId, NodeId) {
    let mut graph = NodeGraph::new();
    let start = add(&mut graph, registry, node_types::BUILD_START);
    let print = add(&mut graph, registry, node_types::OUTPUT_PRINT);
    let sum = add(&mut graph, registry, node_types::MATH_ADD);
    connect(&mut graph, start, "Exec", print, "Exec");
    connect(&mut graph, sum, "Result", print, "Value");

    let message = graph.input(print, "Message").unwrap();
    graph
        .set_socket_value(message, Some(NodeData::String("sum".into())))
        .unwrap();
    for (name, value) in [("A", 2.0), ("B", 3.0)] {
        let socket = graph.input(sum, name).unwrap();
        graph.set_socket_value(socket, Some(NodeData::Number(value))).unwrap();
    }
    (graph, print, sum)
}

#[test]
fn input_keeps_at_most_one_connection() {
    let registry = NodeRegistry::with_builtin_nodes().unwrap();
    let (mut graph, print, _) = sum_graph(&registry);
    let constant = add(&mut graph, &registry, node_types::CONSTANT_NUMBER);

    let replacement = connect(&mut graph, constant, "Value", print, "Value");

    let value_port = graph.input(print, "Value").unwrap().port;
    let into_value: Vec<_> = graph
        .connections()
        .iter()
        .filter(|c| c.to_node == print && c.to_port == value_port)
        .collect();
    assert_eq!(into_value, vec![&replacement]);
}

#[test]
fn fanned_out_output_is_computed_once() {
    let registry = NodeRegistry::with_builtin_nodes().unwrap();
    let (mut graph, print, sum) = sum_graph(&registry);
    let second = add(&mut graph, &registry, node_types::OUTPUT_PRINT);
    connect(&mut graph, print, "Exec", second, "Exec");
    connect(&mut graph, sum, "Result", second, "Value");
    let message = graph.input(second, "Message").unwrap();
    graph
        .set_socket_value(message, Some(NodeData::String("again".into())))
        .unwrap();

    let mut scene = RecordingScene::new();
    let report = NodeGraphEngine::new().run(&graph, &registry, &mut scene).unwrap();

    assert_eq!(report.evaluated, vec![sum]);
    assert_eq!(scene.count("print"), 2);
    assert_eq!(scene.commands()[1].args[1], NodeData::Number(5.0));
}

#[test]
fn rejected_edits_leave_the_graph_unchanged() {
    let registry = NodeRegistry::with_builtin_nodes().unwrap();
    let (mut graph, print, sum) = sum_graph(&registry);
    let text = add(&mut graph, &registry, node_types::CONSTANT_STRING);
    let before = serialize(&graph);

    let output = graph.output(text, "Value").unwrap();
    let input = graph.input(sum, "A").unwrap();
    assert!(matches!(
        graph.connect(output, input),
        Err(GraphError::IncompatibleSocket { .. })
    ));

    let output = graph.output(print, "Exec").unwrap();
    assert!(matches!(
        graph.connect(output, input),
        Err(GraphError::IncompatibleSocket { .. })
    ));

    let value = graph.input(print, "Value").unwrap();
    assert!(matches!(
        graph.set_socket_value(value, Some(NodeData::String("wide".into()))),
        Err(GraphError::IncompatibleValue { .. })
    ));

    assert!(matches!(
        graph.add_node(&registry, node_types::BUILD_START, NodeConfig::new()),
        Err(GraphError::DuplicateUniqueNode { .. })
    ));

    assert_eq!(serialize(&graph), before);
}

#[test]
fn data_cycles_are_rejected() {
    let registry = NodeRegistry::with_builtin_nodes().unwrap();
    let mut graph = NodeGraph::new();
    let first = add(&mut graph, &registry, node_types::MATH_ADD);
    let second = add(&mut graph, &registry, node_types::MATH_ADD);
    connect(&mut graph, first, "Result", second, "A");

    let output = graph.output(second, "Result").unwrap();
    let input = graph.input(first, "A").unwrap();
    assert_eq!(
        graph.connect(output, input),
        Err(GraphError::CycleDetected { from: second, to: first })
    );
    assert_eq!(graph.connection_count(), 1);
}

#[test]
fn sockets_from_another_graph_are_rejected() {
    let registry = NodeRegistry::with_builtin_nodes().unwrap();
    let mut left = NodeGraph::new();
    let mut right = NodeGraph::new();
    let constant = add(&mut left, &registry, node_types::CONSTANT_NUMBER);
    let sum = add(&mut right, &registry, node_types::MATH_ADD);
    // Both nodes have ID 0, so only graph identity tells the sockets apart
    assert_eq!(constant, sum);

    let output = left.output(constant, "Value").unwrap();
    let input = right.input(sum, "A").unwrap();
    assert_eq!(right.connect(output, input), Err(GraphError::CrossGraph));
    assert_eq!(right.connection_count(), 0);
}

#[test]
fn snapshot_round_trip_preserves_structure() {
    let registry = NodeRegistry::with_builtin_nodes().unwrap();
    let (mut graph, _, _) = sum_graph(&registry);
    graph.set_variable("side", NodeData::String("L".into())).unwrap();

    let json = serialize(&graph).to_json().unwrap();
    let snapshot = rigflow::GraphSnapshot::from_json(&json).unwrap();
    let rebuilt = deserialize(&snapshot, &registry).unwrap();

    assert!(rebuilt.structurally_eq(&graph));
    assert_eq!(rebuilt.variable("side"), Some(&NodeData::String("L".into())));
}

#[test]
fn undo_then_redo_restores_each_state() {
    let registry = NodeRegistry::with_builtin_nodes().unwrap();
    let mut graph = NodeGraph::new();
    let mut history = GraphHistory::default();
    history.store_initial(&mut graph);

    let mut states = vec![graph.clone()];
    for node_type in [node_types::BUILD_START, node_types::OUTPUT_PRINT, node_types::MATH_ADD] {
        add(&mut graph, &registry, node_type);
        history.store(&mut graph, format!("Add {}", node_type), true);
        states.push(graph.clone());
    }

    for expected in states.iter().rev().skip(1) {
        assert!(history.undo(&mut graph, &registry).unwrap());
        assert!(graph.structurally_eq(expected));
    }
    for expected in states.iter().skip(1) {
        assert!(history.redo(&mut graph, &registry).unwrap());
        assert!(graph.structurally_eq(expected));
    }
}

#[test]
fn editing_after_undo_discards_redo() {
    let mut editor = NodeEditor::new(EditorConfig::default()).unwrap();
    editor.add_node(node_types::BUILD_START, NodeConfig::new()).unwrap();
    editor.add_node(node_types::MATH_ADD, NodeConfig::new()).unwrap();
    assert!(editor.undo().unwrap());

    editor.add_node(node_types::CONSTANT_NUMBER, NodeConfig::new()).unwrap();

    assert!(!editor.history().can_redo());
    assert!(!editor.redo().unwrap());
    assert_eq!(editor.history().len(), 3);
}

#[test]
fn history_keeps_only_the_newest_stamps() {
    let config = EditorConfig {
        history_capacity: 3,
        ..EditorConfig::default()
    };
    let mut editor = NodeEditor::new(config).unwrap();
    for _ in 0..5 {
        editor.add_node(node_types::CONSTANT_NUMBER, NodeConfig::new()).unwrap();
    }
    assert_eq!(editor.history().len(), 3);

    while editor.undo().unwrap() {}
    assert_eq!(editor.graph().node_count(), 3);
}

#[test]
fn missing_input_fails_until_it_is_fed() {
    let mut editor = NodeEditor::new(EditorConfig::default()).unwrap();
    let start = editor.add_node(node_types::BUILD_START, NodeConfig::new()).unwrap();
    let print = editor
        .add_node(node_types::OUTPUT_PRINT, NodeConfig::new().with_title("Report"))
        .unwrap();
    editor.connect(start, "Exec", print, "Exec").unwrap();

    let mut scene = RecordingScene::new();
    let err = editor.run(&mut scene).unwrap_err();
    assert!(matches!(
        err,
        EditorError::Execution(ExecutionError::MissingRequiredInput { node, ref title, ref socket })
            if node == print && title == "Report" && socket == "Message"
    ));
    assert_eq!(scene.count("print"), 0);

    let text = editor
        .add_node(
            node_types::CONSTANT_STRING,
            NodeConfig::new().with_parameter("value", NodeData::String("ready".into())),
        )
        .unwrap();
    editor.connect(text, "Value", print, "Message").unwrap();

    let report = editor.run(&mut scene).unwrap();
    assert_eq!(report.executed, vec![start, print]);
    assert_eq!(scene.commands()[0].args, vec![NodeData::String("ready".into())]);
}

#[test]
fn disconnecting_one_consumer_keeps_the_other() {
    let mut editor = NodeEditor::new(EditorConfig::default()).unwrap();
    let start = editor.add_node(node_types::BUILD_START, NodeConfig::new()).unwrap();
    let first = editor.add_node(node_types::OUTPUT_PRINT, NodeConfig::new()).unwrap();
    let second = editor.add_node(node_types::OUTPUT_PRINT, NodeConfig::new()).unwrap();
    let width = editor
        .add_node(
            node_types::CONSTANT_NUMBER,
            NodeConfig::new().with_parameter("value", NodeData::Number(4.0)),
        )
        .unwrap();
    editor.connect(start, "Exec", first, "Exec").unwrap();
    editor.connect(first, "Exec", second, "Exec").unwrap();
    for print in [first, second] {
        editor
            .set_socket_value(print, "Message", Some(NodeData::String("width".into())))
            .unwrap();
        editor.connect(width, "Value", print, "Value").unwrap();
    }

    assert!(editor.disconnect_input(first, "Value").unwrap());

    let mut scene = RecordingScene::new();
    editor.run(&mut scene).unwrap();
    assert_eq!(scene.commands()[0].args, vec![NodeData::String("width".into())]);
    assert_eq!(
        scene.commands()[1].args,
        vec![NodeData::String("width".into()), NodeData::Number(4.0)]
    );
}

#[test]
fn saved_graph_reopens_and_runs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("arm.rig.json");

    let mut editor = NodeEditor::new(EditorConfig::default()).unwrap();
    let start = editor.add_node(node_types::BUILD_START, NodeConfig::new()).unwrap();
    let end = editor.add_node(node_types::BUILD_END, NodeConfig::new()).unwrap();
    editor.connect(start, "Exec", end, "Exec").unwrap();
    editor.save_as(&path).unwrap();
    assert!(!editor.is_modified());

    let mut reopened = NodeEditor::new(EditorConfig::default()).unwrap();
    reopened.open(&path).unwrap();
    assert!(reopened.graph().structurally_eq(editor.graph()));
    assert!(!reopened.history().can_undo());

    let mut scene = RecordingScene::new();
    reopened.run(&mut scene).unwrap();
    assert_eq!(scene.count("build_complete"), 1);
}

#[test]
fn infinite_literal_is_refused_and_file_still_reopens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scale.rig.json");

    let mut editor = NodeEditor::new(EditorConfig::default()).unwrap();
    let start = editor.add_node(node_types::BUILD_START, NodeConfig::new()).unwrap();
    let print = editor.add_node(node_types::OUTPUT_PRINT, NodeConfig::new()).unwrap();
    let sum = editor.add_node(node_types::MATH_ADD, NodeConfig::new()).unwrap();
    editor.connect(start, "Exec", print, "Exec").unwrap();
    editor.connect(sum, "Result", print, "Value").unwrap();
    editor
        .set_socket_value(print, "Message", Some(NodeData::String("scale".into())))
        .unwrap();
    editor.set_socket_value(sum, "A", Some(NodeData::Number(1.0))).unwrap();
    editor.set_socket_value(sum, "B", Some(NodeData::Number(2.0))).unwrap();

    let err = editor
        .set_socket_value(sum, "B", Some(NodeData::Number(f64::INFINITY)))
        .unwrap_err();
    assert!(matches!(err, EditorError::Graph(GraphError::NonFiniteValue(_))));
    editor.save_as(&path).unwrap();

    let mut reopened = NodeEditor::new(EditorConfig::default()).unwrap();
    reopened.open(&path).unwrap();
    assert!(reopened.graph().structurally_eq(editor.graph()));

    let mut scene = RecordingScene::new();
    reopened.run(&mut scene).unwrap();
    assert_eq!(
        scene.commands()[0].args,
        vec![NodeData::String("scale".into()), NodeData::Number(3.0)]
    );
}
