//! Core logic for the print node

use crate::nodes::interface::NodeData;

/// Text the print node reports, e.g. `width: 2.5`
pub fn format_message(message: &str, value: Option<&NodeData>) -> String {
    match value {
        Some(value) => format!("{}: {}", message, value),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        assert_eq!(format_message("width", Some(&NodeData::Number(2.5))), "width: 2.5");
        assert_eq!(format_message("done", None), "done");
    }
}
