//! rigflow - headless build graph shell
//!
//! Reads one command per line from stdin and applies it to an editor
//! session. Builds run against an in-memory recording scene.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use log::{info, warn};

use rigflow::constants::file;
use rigflow::nodes::{NodeConfig, NodeData, NodeId};
use rigflow::{EditorConfig, EditorError, HostScene, NodeEditor, RecordingScene};

const HELP: &str = "\
commands:
  new                              start an empty graph
  open <path>                      load a graph file
  save [path]                      save to the current or a new path
  add <type> [title]               add a node
  connect <from> <out> <to> <in>   connect two sockets by name
  disconnect <node> <input>        remove the connection into an input
  set <node> <input> <value|none>  set or clear an input literal
  param <node> <name> <value>      set a node parameter
  var <name> <value>               set a graph variable
  rename <node> <title>            rename a node
  delete <node>                    remove a node and its connections
  select <node> | select none      change the selection
  delete-selected                  remove everything selected
  undo | redo                      step through history
  run                              execute the build
  list | types | history | scene   inspect the session
  quit";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    New,
    Open(PathBuf),
    Save(Option<PathBuf>),
    Add { node_type: String, title: Option<String> },
    Connect { from: NodeId, output: String, to: NodeId, input: String },
    Disconnect { node: NodeId, input: String },
    Set { node: NodeId, input: String, value: Option<NodeData> },
    Param { node: NodeId, name: String, value: NodeData },
    Var { name: String, value: NodeData },
    Rename { node: NodeId, title: String },
    Delete(NodeId),
    Select(Option<NodeId>),
    DeleteSelected,
    Undo,
    Redo,
    Run,
    List,
    Types,
    History,
    Scene,
    Help,
    Quit,
}

fn parse_id(text: Option<&str>) -> Result<NodeId, String> {
    let text = text.ok_or("missing node id")?;
    text.parse()
        .map_err(|_| format!("'{}' is not a node id", text))
}

fn required<'a>(text: Option<&'a str>, what: &str) -> Result<&'a str, String> {
    text.ok_or_else(|| format!("missing {}", what))
}

/// Everything after the first `skip` words, joined back together
fn rest(line: &str, skip: usize) -> Option<String> {
    let rest = line.split_whitespace().skip(skip).collect::<Vec<_>>().join(" ");
    (!rest.is_empty()).then_some(rest)
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Err("empty command".to_string());
    };

    let command = match keyword {
        "new" => Command::New,
        "open" => Command::Open(PathBuf::from(required(words.next(), "path")?)),
        "save" => Command::Save(words.next().map(PathBuf::from)),
        "add" => Command::Add {
            node_type: required(words.next(), "node type")?.to_string(),
            title: rest(line, 2),
        },
        "connect" => Command::Connect {
            from: parse_id(words.next())?,
            output: required(words.next(), "output name")?.to_string(),
            to: parse_id(words.next())?,
            input: required(words.next(), "input name")?.to_string(),
        },
        "disconnect" => Command::Disconnect {
            node: parse_id(words.next())?,
            input: required(words.next(), "input name")?.to_string(),
        },
        "set" => {
            let node = parse_id(words.next())?;
            let input = required(words.next(), "input name")?.to_string();
            let value = rest(line, 3).ok_or("missing value")?;
            let value = (value != "none").then(|| NodeData::parse_literal(&value));
            Command::Set { node, input, value }
        }
        "param" => {
            let node = parse_id(words.next())?;
            let name = required(words.next(), "parameter name")?.to_string();
            let value = rest(line, 3).ok_or("missing value")?;
            Command::Param { node, name, value: NodeData::parse_literal(&value) }
        }
        "var" => {
            let name = required(words.next(), "variable name")?.to_string();
            let value = rest(line, 2).ok_or("missing value")?;
            Command::Var { name, value: NodeData::parse_literal(&value) }
        }
        "rename" => Command::Rename {
            node: parse_id(words.next())?,
            title: rest(line, 2).ok_or("missing title")?,
        },
        "delete" => Command::Delete(parse_id(words.next())?),
        "select" => match words.next() {
            Some("none") => Command::Select(None),
            other => Command::Select(Some(parse_id(other)?)),
        },
        "delete-selected" => Command::DeleteSelected,
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "run" => Command::Run,
        "list" => Command::List,
        "types" => Command::Types,
        "history" => Command::History,
        "scene" => Command::Scene,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(command)
}

/// Apply one command and describe the outcome
fn execute(
    editor: &mut NodeEditor,
    scene: &mut RecordingScene,
    command: Command,
) -> Result<String, EditorError> {
    let message = match command {
        Command::New => {
            editor.new_graph();
            "new graph".to_string()
        }
        Command::Open(path) => {
            editor.open(&path)?;
            format!("opened {} ({} nodes)", path.display(), editor.graph().node_count())
        }
        Command::Save(Some(mut path)) => {
            if path.extension().is_none() {
                path.set_extension(file::EXTENSION);
            }
            editor.save_as(&path)?;
            format!("saved {}", path.display())
        }
        Command::Save(None) => {
            editor.save()?;
            "saved".to_string()
        }
        Command::Add { node_type, title } => {
            let config = match title {
                Some(title) => NodeConfig::new().with_title(title),
                None => NodeConfig::new(),
            };
            let id = editor.add_node(&node_type, config)?;
            format!("added node {}", id)
        }
        Command::Connect { from, output, to, input } => {
            let connection = editor.connect(from, &output, to, &input)?;
            format!(
                "connected {}:{} -> {}:{}",
                connection.from_node, output, connection.to_node, input
            )
        }
        Command::Disconnect { node, input } => {
            if editor.disconnect_input(node, &input)? {
                "disconnected".to_string()
            } else {
                format!("nothing connected to {} on node {}", input, node)
            }
        }
        Command::Set { node, input, value } => {
            editor.set_socket_value(node, &input, value)?;
            "ok".to_string()
        }
        Command::Param { node, name, value } => {
            editor.set_parameter(node, &name, value)?;
            "ok".to_string()
        }
        Command::Var { name, value } => {
            editor.set_variable(&name, value)?;
            "ok".to_string()
        }
        Command::Rename { node, title } => {
            editor.rename_node(node, &title)?;
            "ok".to_string()
        }
        Command::Delete(node) => {
            if editor.remove_node(node) {
                format!("removed node {}", node)
            } else {
                format!("no node {}", node)
            }
        }
        Command::Select(Some(node)) => {
            editor.select_node(node)?;
            format!("selected node {}", node)
        }
        Command::Select(None) => {
            editor.clear_selection();
            "selection cleared".to_string()
        }
        Command::DeleteSelected => format!("removed {} item(s)", editor.delete_selected()),
        Command::Undo => match editor.undo()? {
            true => "undone".to_string(),
            false => "nothing to undo".to_string(),
        },
        Command::Redo => match editor.redo()? {
            true => "redone".to_string(),
            false => "nothing to redo".to_string(),
        },
        Command::Run => {
            let report = editor.run(scene)?;
            format!(
                "build completed: {} exec node(s), {} data node(s) in {:?}",
                report.executed.len(),
                report.evaluated.len(),
                report.elapsed
            )
        }
        Command::List => describe_graph(editor),
        Command::Types => describe_types(editor),
        Command::History => {
            let history = editor.history();
            history
                .stamps()
                .iter()
                .enumerate()
                .map(|(i, stamp)| {
                    let marker = if i == history.current_step() { ">" } else { " " };
                    format!("{} {:2} {}", marker, i, stamp.description)
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Scene => {
            let mut lines: Vec<String> = scene
                .commands()
                .iter()
                .map(|c| format!("{} {:?}", c.command, c.args))
                .collect();
            if let Some(asset) = scene.current_asset() {
                lines.insert(0, format!("asset: {}", asset));
            }
            lines.join("\n")
        }
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(message)
}

/// Node types grouped by category
fn describe_types(editor: &NodeEditor) -> String {
    let registry = editor.registry();
    let mut lines = Vec::new();
    for category in registry.categories() {
        lines.push(category.display_string());
        for node_type in registry.nodes_in_category(category) {
            if let Some(metadata) = registry.get_metadata(node_type) {
                lines.push(format!(
                    "  {:<18} {} - {}",
                    node_type, metadata.display_name, metadata.description
                ));
            }
        }
    }
    lines.join("\n")
}

fn describe_graph(editor: &NodeEditor) -> String {
    let graph = editor.graph();
    let mut lines = Vec::new();
    for node in graph.nodes_iter() {
        lines.push(format!("[{}] {} ({})", node.id, node.title, node.type_id));
        for port in &node.inputs {
            let source = match graph.connection_into(node.id, port.id) {
                Some(c) => format!("<- node {} port {}", c.from_node, c.from_port),
                None => match &port.value {
                    Some(value) => format!("= {}", value),
                    None if port.required => "(required)".to_string(),
                    None => String::new(),
                },
            };
            lines.push(format!("    in  {}: {} {}", port.name, port.data_type, source));
        }
        for port in &node.outputs {
            lines.push(format!("    out {}: {}", port.name, port.data_type));
        }
    }
    for (name, value) in graph.variables() {
        lines.push(format!("${} = {}", name, value));
    }
    if lines.is_empty() {
        "empty graph".to_string()
    } else {
        lines.join("\n")
    }
}

fn main() {
    let config = match EditorConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("warning: {}; using default config", err);
            EditorConfig::default()
        }
    };
    // RUST_LOG wins over the configured level
    env_logger::Builder::new()
        .filter_level(config.level_filter())
        .parse_env(env_logger::Env::default())
        .init();
    info!("Starting rigflow shell");

    let mut editor = match NodeEditor::new(config) {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };
    let mut scene = RecordingScene::new();

    if let Some(path) = std::env::args().nth(1) {
        let path = PathBuf::from(path);
        if let Err(err) = editor.open(&path) {
            warn!("Could not open {}: {}", path.display(), err);
            eprintln!("error: {}", err);
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("{}> ", editor.title());
        if stdout.flush().is_err() {
            break;
        }

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("error: {}", err);
                break;
            }
        }
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => match execute(&mut editor, &mut scene, command) {
                Ok(message) if message.is_empty() => {}
                Ok(message) => println!("{}", message),
                Err(err) => println!("error: {}", err),
            },
            Err(message) => println!("error: {}", message),
        }
    }

    if editor.is_modified() {
        warn!("Exiting with unsaved changes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("connect 0 Exec 2 Exec"),
            Ok(Command::Connect {
                from: 0,
                output: "Exec".into(),
                to: 2,
                input: "Exec".into(),
            })
        );
        assert_eq!(
            parse_command("add Output_Print Report width"),
            Ok(Command::Add {
                node_type: "Output_Print".into(),
                title: Some("Report width".into()),
            })
        );
        assert_eq!(
            parse_command("set 3 Message \"arm length\""),
            Ok(Command::Set {
                node: 3,
                input: "Message".into(),
                value: Some(NodeData::String("arm length".into())),
            })
        );
        assert_eq!(
            parse_command("set 3 Value none"),
            Ok(Command::Set { node: 3, input: "Value".into(), value: None })
        );
        assert_eq!(parse_command("select none"), Ok(Command::Select(None)));
        assert!(parse_command("connect x Exec 2 Exec").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn test_shell_session() {
        let mut editor = NodeEditor::new(EditorConfig::default()).unwrap();
        let mut scene = RecordingScene::new();
        let script = [
            "add Build_Start",
            "add Output_Print",
            "add Constant_Number",
            "param 2 value 1.5",
            "connect 0 Exec 1 Exec",
            "connect 2 Value 1 Value",
            "set 1 Message width",
            "run",
        ];
        for line in script {
            let command = parse_command(line).unwrap();
            execute(&mut editor, &mut scene, command).unwrap();
        }
        assert_eq!(
            scene.commands()[0].args,
            vec![NodeData::String("width".into()), NodeData::Number(1.5)]
        );

        let undo = parse_command("undo").unwrap();
        assert_eq!(execute(&mut editor, &mut scene, undo).unwrap(), "undone");
    }

    #[test]
    fn test_infinite_literal_is_an_error() {
        let mut editor = NodeEditor::new(EditorConfig::default()).unwrap();
        let mut scene = RecordingScene::new();
        let add = parse_command("add Math_Add").unwrap();
        execute(&mut editor, &mut scene, add).unwrap();
        let stamps = editor.history().len();

        let set = parse_command("set 0 A inf").unwrap();
        assert!(execute(&mut editor, &mut scene, set).is_err());
        assert_eq!(editor.history().len(), stamps);

        // Untyped slots keep the word as text
        let var = parse_command("var gain -inf").unwrap();
        execute(&mut editor, &mut scene, var).unwrap();
        assert_eq!(
            editor.graph().variables().get("gain"),
            Some(&NodeData::String("-inf".into()))
        );
    }

    #[test]
    fn test_types_are_grouped_by_category() {
        let mut editor = NodeEditor::new(EditorConfig::default()).unwrap();
        let mut scene = RecordingScene::new();
        let listing = execute(&mut editor, &mut scene, Command::Types).unwrap();
        let lines: Vec<&str> = listing.lines().collect();

        let math = lines.iter().position(|l| *l == "Math").unwrap();
        assert!(lines[math + 1].trim_start().starts_with("Math_Add"));
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("  ")).count(),
            editor.registry().node_types().len()
        );
    }
}
