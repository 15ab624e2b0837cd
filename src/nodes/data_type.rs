//! Socket type registry
//!
//! The closed set of kinds a socket can carry and the rules that decide
//! which output kinds may feed which input kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::nodes::interface::NodeData;

/// Data kinds that can flow through sockets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Control flow, carries no value
    Exec,
    /// Text string
    String,
    /// Floating point number
    Number,
    /// Whole number
    Integer,
    /// Boolean value
    Boolean,
    /// 3D vector (x, y, z)
    Vector3,
    /// Handle to a host scene object of the named kind (e.g. "joint")
    Reference(String),
}

/// Widenings accepted in addition to identity matches, as (output, input)
pub const WIDENINGS: &[(DataType, DataType)] = &[(DataType::Integer, DataType::Number)];

/// Check whether an output of kind `output` may feed an input of kind `input`
pub fn is_compatible(output: &DataType, input: &DataType) -> bool {
    match (output, input) {
        (DataType::Exec, DataType::Exec) => true,
        (DataType::Exec, _) | (_, DataType::Exec) => false,
        _ if output == input => true,
        _ => WIDENINGS
            .iter()
            .any(|(from, to)| from == output && to == input),
    }
}

impl DataType {
    /// Shorthand for a typed host reference
    pub fn reference(kind: impl Into<String>) -> Self {
        DataType::Reference(kind.into())
    }

    /// Check if this is the control-flow kind
    pub fn is_exec(&self) -> bool {
        matches!(self, DataType::Exec)
    }

    /// Check if a literal value may be stored on a socket of this kind.
    ///
    /// Non-finite numbers are refused since they cannot be written to a
    /// graph file.
    pub fn accepts(&self, value: &NodeData) -> bool {
        is_compatible(&value.data_type(), self) && value.is_finite()
    }

    /// Convert a value arriving at a socket of this kind.
    ///
    /// Returns the value's own kind as the error when it does not fit.
    pub fn coerce(&self, value: NodeData) -> Result<NodeData, DataType> {
        let got = value.data_type();
        if &got == self {
            return Ok(value);
        }
        match (self, value) {
            (DataType::Number, NodeData::Integer(i)) => Ok(NodeData::Number(i as f64)),
            _ => Err(got),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Exec => write!(f, "Exec"),
            DataType::String => write!(f, "String"),
            DataType::Number => write!(f, "Number"),
            DataType::Integer => write!(f, "Integer"),
            DataType::Boolean => write!(f, "Boolean"),
            DataType::Vector3 => write!(f, "Vector3"),
            DataType::Reference(kind) => write!(f, "Reference<{}>", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_compatible() {
        for kind in [
            DataType::String,
            DataType::Number,
            DataType::Integer,
            DataType::Boolean,
            DataType::Vector3,
            DataType::reference("joint"),
        ] {
            assert!(is_compatible(&kind, &kind), "{} should accept itself", kind);
        }
    }

    #[test]
    fn test_exec_only_connects_to_exec() {
        assert!(is_compatible(&DataType::Exec, &DataType::Exec));
        assert!(!is_compatible(&DataType::Exec, &DataType::Number));
        assert!(!is_compatible(&DataType::String, &DataType::Exec));
        assert!(!is_compatible(&DataType::Integer, &DataType::Exec));
    }

    #[test]
    fn test_widening_is_one_way() {
        assert!(is_compatible(&DataType::Integer, &DataType::Number));
        assert!(!is_compatible(&DataType::Number, &DataType::Integer));
        assert!(!is_compatible(&DataType::Boolean, &DataType::Integer));
    }

    #[test]
    fn test_references_match_by_kind() {
        assert!(!is_compatible(
            &DataType::reference("joint"),
            &DataType::reference("mesh")
        ));
    }

    #[test]
    fn test_coerce_integer_into_number() {
        assert_eq!(
            DataType::Number.coerce(NodeData::Integer(3)),
            Ok(NodeData::Number(3.0))
        );
        assert_eq!(
            DataType::Integer.coerce(NodeData::Number(3.0)),
            Err(DataType::Number)
        );
    }

    #[test]
    fn test_accepts_literal() {
        assert!(DataType::Number.accepts(&NodeData::Integer(1)));
        assert!(!DataType::Exec.accepts(&NodeData::Boolean(true)));
        assert!(!DataType::String.accepts(&NodeData::Number(1.0)));
        assert!(!DataType::Number.accepts(&NodeData::Number(f64::INFINITY)));
        assert!(!DataType::Vector3.accepts(&NodeData::Vector3([0.0, f64::NAN, 0.0])));
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::reference("joint").to_string(), "Reference<joint>");
        assert_eq!(DataType::Number.to_string(), "Number");
    }
}
