//! Values that flow between nodes and live in node parameters

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::nodes::data_type::DataType;

/// Core data values carried by data sockets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeData {
    Number(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
    Vector3([f64; 3]),
    /// Handle to a host scene object
    Reference { kind: String, name: String },
}

impl NodeData {
    /// Kind of socket this value belongs to
    pub fn data_type(&self) -> DataType {
        match self {
            NodeData::Number(_) => DataType::Number,
            NodeData::Integer(_) => DataType::Integer,
            NodeData::Boolean(_) => DataType::Boolean,
            NodeData::String(_) => DataType::String,
            NodeData::Vector3(_) => DataType::Vector3,
            NodeData::Reference { kind, .. } => DataType::Reference(kind.clone()),
        }
    }

    pub fn reference(kind: impl Into<String>, name: impl Into<String>) -> Self {
        NodeData::Reference {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Numeric view, widening integers
    pub fn as_number(&self) -> Option<f64> {
        match self {
            NodeData::Number(n) => Some(*n),
            NodeData::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            NodeData::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NodeData::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// False for numbers and vectors holding NaN or an infinity
    pub fn is_finite(&self) -> bool {
        match self {
            NodeData::Number(n) => n.is_finite(),
            NodeData::Vector3(v) => v.iter().all(|c| c.is_finite()),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NodeData::String(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a literal typed at the command line.
    ///
    /// `true`/`false` become booleans, whole numbers integers, other finite
    /// numbers floats, `x,y,z` vectors, `kind:name` references when prefixed
    /// with `@`, and anything else a string (surrounding quotes are stripped).
    /// `inf` and `NaN` stay strings.
    pub fn parse_literal(text: &str) -> NodeData {
        let text = text.trim();
        if let Some(reference) = text.strip_prefix('@') {
            if let Some((kind, name)) = reference.split_once(':') {
                return NodeData::reference(kind, name);
            }
        }
        match text {
            "true" => return NodeData::Boolean(true),
            "false" => return NodeData::Boolean(false),
            _ => {}
        }
        if let Ok(i) = text.parse::<i64>() {
            return NodeData::Integer(i);
        }
        if let Ok(n) = text.parse::<f64>() {
            if n.is_finite() {
                return NodeData::Number(n);
            }
        }
        let parts: Vec<&str> = text.split(',').collect();
        if parts.len() == 3 {
            let parsed: Vec<f64> = parts
                .iter()
                .filter_map(|p| p.trim().parse::<f64>().ok())
                .filter(|c| c.is_finite())
                .collect();
            if parsed.len() == 3 {
                return NodeData::Vector3([parsed[0], parsed[1], parsed[2]]);
            }
        }
        let unquoted = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text);
        NodeData::String(unquoted.to_string())
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeData::Number(n) => write!(f, "{}", n),
            NodeData::Integer(i) => write!(f, "{}", i),
            NodeData::Boolean(b) => write!(f, "{}", b),
            NodeData::String(s) => write!(f, "{}", s),
            NodeData::Vector3([x, y, z]) => write!(f, "({}, {}, {})", x, y, z),
            NodeData::Reference { kind, name } => write!(f, "<{} {}>", kind, name),
        }
    }
}
