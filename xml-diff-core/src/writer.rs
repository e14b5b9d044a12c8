//! [`Tree`] to XML source text serialization.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::node::{NodeId, Tree};

/// Errors that can occur while writing XML from a [`Tree`].
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to serialize XML bytes.
    #[error("failed to write XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Failed to write output file.
    #[error("failed to write XML file: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize a [`Tree`] into XML bytes, pretty-printed with two-space indent
/// when `pretty_print` is set.
pub fn write(tree: &Tree, pretty_print: bool) -> Result<Vec<u8>, WriteError> {
    let mut writer = if pretty_print {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };
    write_node(&mut writer, tree, tree.root())?;
    Ok(writer.into_inner())
}

/// Serialize a [`Tree`] and write it to `path`.
pub fn write_file(tree: &Tree, path: &Path, pretty_print: bool) -> Result<(), WriteError> {
    let bytes = write(tree, pretty_print)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, tree: &Tree, id: NodeId) -> Result<(), quick_xml::Error> {
    let node = tree.node(id);
    let tag_name = node.tag.display();
    let mut start = BytesStart::new(&tag_name);

    for (key, value) in &node.attributes {
        start.push_attribute((key.display().as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_none() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        if let Some(text) = &node.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for &child in &node.children {
            write_node(writer, tree, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(&tag_name)))?;
    }

    if let Some(tail) = &node.tail {
        writer.write_event(Event::Text(BytesText::new(tail)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, QName};
    use crate::parser::{parse, WhitespaceMode};

    #[test]
    fn round_trips_simple_document() {
        let xml = br#"<root a="1"><child>hello</child></root>"#;
        let tree = parse(xml, WhitespaceMode::None).unwrap();
        let out = write(&tree, false).unwrap();
        let reparsed = parse(&out, WhitespaceMode::None).unwrap();

        assert_eq!(reparsed.node(reparsed.root()).tag.display(), "root");
        let child = reparsed.node(reparsed.node(reparsed.root()).children[0]);
        assert_eq!(child.text.as_deref(), Some("hello"));
    }

    #[test]
    fn childless_textless_node_writes_as_empty_element() {
        let tree = Tree::new(Node::new(QName::local("leaf")));
        let out = write(&tree, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<leaf/>");
    }

    #[test]
    fn tail_text_follows_end_tag() {
        let mut tree = Tree::new(Node::new(QName::local("root")));
        let a = tree.alloc(Node::new(QName::local("a")));
        tree.node_mut(a).tail = Some("after".to_string());
        tree.append_child(tree.root(), a);

        let out = String::from_utf8(write(&tree, false).unwrap()).unwrap();
        assert_eq!(out, "<root><a/>after</root>");
    }
}
