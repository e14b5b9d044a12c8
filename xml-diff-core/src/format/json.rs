//! Structured JSON rendering of an edit script.

use crate::edit::EditOperation;

/// Render an edit script as a pretty-printed JSON array, one object per
/// operation, tagged by its `op` field.
pub fn format_json(ops: &[EditOperation]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_delete_node_with_op_tag() {
        let ops = vec![EditOperation::DeleteNode { node: "/r/n[1]".to_string() }];
        let rendered = format_json(&ops).unwrap();
        assert!(rendered.contains("\"op\": \"delete-node\""));
        assert!(rendered.contains("/r/n[1]"));
    }
}
