//! Line-oriented wire-form rendering of an edit script: one JSON array per
//! operation, `[<verb>, <arg>, ...]`.

use serde_json::{json, Value};

use crate::edit::EditOperation;

fn text_value(text: &Option<String>) -> Value {
    match text {
        Some(t) => json!(t),
        None => Value::Null,
    }
}

fn line(op: &EditOperation) -> Value {
    match op {
        EditOperation::InsertNode { target, tag, position } => {
            json!(["insert", tag.display(), target, position])
        }
        EditOperation::DeleteNode { node } => json!(["delete", node]),
        EditOperation::MoveNode { node, target, position } => {
            json!(["move", node, target, position])
        }
        EditOperation::InsertAttrib { node, name, value } => {
            json!(["insert-attribute", node, name.display(), value])
        }
        EditOperation::DeleteAttrib { node, name } => {
            json!(["delete-attribute", node, name.display()])
        }
        EditOperation::RenameAttrib { node, old_name, new_name } => {
            json!(["move-attribute", node, old_name.display(), new_name.display()])
        }
        EditOperation::UpdateAttrib { node, name, value } => {
            json!(["update-attribute", node, name.display(), value])
        }
        EditOperation::UpdateTextIn { node, text } => {
            json!(["update-text", node, text_value(text)])
        }
        EditOperation::UpdateTextAfter { node, text } => {
            json!(["update-text-after", node, text_value(text)])
        }
    }
}

/// Render an edit script one compact JSON array per line.
pub fn format_wire(ops: &[EditOperation]) -> String {
    ops.iter()
        .map(|op| line(op).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::QName;

    #[test]
    fn move_node_line_has_four_fields() {
        let op = EditOperation::MoveNode {
            node: "/r/a[1]".to_string(),
            target: "/r".to_string(),
            position: 2,
        };
        let rendered = format_wire(std::slice::from_ref(&op));
        assert_eq!(rendered, r#"["move","/r/a[1]","/r",2]"#);
    }

    #[test]
    fn rename_attrib_uses_move_attribute_verb() {
        let op = EditOperation::RenameAttrib {
            node: "/r/n[1]".to_string(),
            old_name: QName::local("attr1"),
            new_name: QName::local("attr4"),
        };
        let rendered = format_wire(std::slice::from_ref(&op));
        assert_eq!(rendered, r#"["move-attribute","/r/n[1]","attr1","attr4"]"#);
    }

    #[test]
    fn update_text_with_null_uses_json_null() {
        let op = EditOperation::UpdateTextIn { node: "/r/n[1]".to_string(), text: None };
        let rendered = format_wire(std::slice::from_ref(&op));
        assert_eq!(rendered, r#"["update-text","/r/n[1]",null]"#);
    }

    #[test]
    fn embedded_newline_survives_json_escaping() {
        let op = EditOperation::UpdateTextIn {
            node: "/r/n[1]".to_string(),
            text: Some("line one\nline two".to_string()),
        };
        let rendered = format_wire(std::slice::from_ref(&op));
        assert!(rendered.contains(r"\n"));
        assert!(!rendered.contains('\n'));
    }
}
