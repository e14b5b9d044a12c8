//! XML source text to [`Tree`] parsing.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

use crate::node::{Node, NodeId, QName, Tree};
use crate::textsim::cleanup_whitespace;

/// Errors that can occur while parsing XML into a [`Tree`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input XML could not be decoded or tokenized.
    #[error("failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Input bytes were not valid UTF-8 for tag/attribute/text extraction.
    #[error("invalid UTF-8 while parsing XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// Failed to decode text entity or bytes.
    #[error("failed to decode XML text: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    /// Failed to read input file.
    #[error("failed to read XML file: {0}")]
    Io(#[from] std::io::Error),
    /// Structural issue in the XML document.
    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// How runs of whitespace in the source document are normalized during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespaceMode {
    /// Keep text and tags byte-for-byte as written.
    #[default]
    None,
    /// Drop whitespace-only text nodes found between tags entirely.
    Tags,
    /// Collapse internal whitespace runs within text/tail content to a single space.
    Text,
    /// Apply both `Tags` and `Text` normalization.
    Both,
}

/// Parse XML bytes into a [`Tree`], resolving namespaces into [`QName`]s.
pub fn parse(xml: &[u8], ws: WhitespaceMode) -> Result<Tree, ParseError> {
    let mut reader = NsReader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut arena: Vec<Node> = Vec::new();
    // One stack entry per open element: its arena id, and the id of the
    // last child attached to it so far (trailing text becomes that child's
    // tail rather than this element's own text).
    let mut stack: Vec<(NodeId, Option<NodeId>)> = Vec::new();
    let mut root: Option<NodeId> = None;
    let mut prefixes: IndexMap<String, String> = IndexMap::new();

    loop {
        let (resolved_ns, event) = reader.read_resolved_event_into(&mut buf)?;
        match event {
            Event::Start(e) => {
                let node = build_node(&reader, resolved_ns, &e, &mut prefixes)?;
                let id = alloc(&mut arena, node);
                attach(&mut arena, &mut stack, &mut root, id)?;
                stack.push((id, None));
            }
            Event::Empty(e) => {
                let node = build_node(&reader, resolved_ns, &e, &mut prefixes)?;
                let id = alloc(&mut arena, node);
                attach(&mut arena, &mut stack, &mut root, id)?;
            }
            Event::Text(e) => {
                let raw = e.unescape()?.into_owned();
                apply_text(&mut arena, &stack, &raw, ws);
            }
            Event::CData(e) => {
                let raw = std::str::from_utf8(e.as_ref())?.to_string();
                apply_text(&mut arena, &stack, &raw, ws);
            }
            Event::End(_) => {
                stack
                    .pop()
                    .ok_or_else(|| ParseError::Malformed("encountered closing tag without open tag".to_string()))?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ParseError::Malformed("unclosed element(s) at end of document".to_string()));
    }

    let root = root.ok_or_else(|| ParseError::Malformed("no root element found".to_string()))?;
    let mut tree = Tree::from_parts(arena, root);
    tree.prefixes = prefixes;
    Ok(tree)
}

/// Parse an XML file into a [`Tree`].
pub fn parse_file(path: &Path, ws: WhitespaceMode) -> Result<Tree, ParseError> {
    let bytes = fs::read(path)?;
    parse(&bytes, ws)
}

fn alloc(arena: &mut Vec<Node>, node: Node) -> NodeId {
    arena.push(node);
    arena.len() - 1
}

/// Attach a freshly allocated node to the current open parent, or record it
/// as the document root if the stack is empty.
fn attach(
    arena: &mut [Node],
    stack: &mut [(NodeId, Option<NodeId>)],
    root: &mut Option<NodeId>,
    id: NodeId,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some((parent_id, last_child)) => {
            let parent_id = *parent_id;
            arena[parent_id].children.push(id);
            arena[id].parent = Some(parent_id);
            *last_child = Some(id);
            Ok(())
        }
        None => {
            if root.is_some() {
                return Err(ParseError::Malformed("multiple top-level elements found".to_string()));
            }
            *root = Some(id);
            Ok(())
        }
    }
}

fn apply_text(arena: &mut [Node], stack: &[(NodeId, Option<NodeId>)], raw: &str, ws: WhitespaceMode) {
    let normalized = match ws {
        WhitespaceMode::None | WhitespaceMode::Tags => raw.to_string(),
        WhitespaceMode::Text | WhitespaceMode::Both => cleanup_whitespace(raw),
    };
    let collapse_empty = matches!(ws, WhitespaceMode::Tags | WhitespaceMode::Both);
    if collapse_empty && normalized.trim().is_empty() {
        return;
    }

    let Some(&(parent_id, last_child)) = stack.last() else {
        return;
    };

    let slot = match last_child {
        Some(child_id) => &mut arena[child_id].tail,
        None => &mut arena[parent_id].text,
    };
    match slot {
        Some(existing) => existing.push_str(&normalized),
        None => *slot = Some(normalized),
    }
}

fn build_node(
    reader: &NsReader<&[u8]>,
    resolved_ns: ResolveResult,
    e: &quick_xml::events::BytesStart<'_>,
    prefixes: &mut IndexMap<String, String>,
) -> Result<Node, ParseError> {
    let tag = qname_from_resolved(resolved_ns, e.name().local_name().as_ref(), prefixes)?;
    let mut node = Node::new(tag);

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let raw_key = attr.key.as_ref();
        if raw_key == b"xmlns" || raw_key.starts_with(b"xmlns:") {
            // Namespace declarations are not data attributes.
            continue;
        }
        let (attr_ns, local) = reader.resolve_attribute(attr.key);
        let name = qname_from_resolved(attr_ns, local.local_name().as_ref(), prefixes)?;
        let value = attr.decode_and_unescape_value(reader.decoder())?.into_owned();
        node.attributes.insert(name, value);
    }

    Ok(node)
}

fn qname_from_resolved(
    resolved: ResolveResult,
    local: &[u8],
    prefixes: &mut IndexMap<String, String>,
) -> Result<QName, ParseError> {
    let local = std::str::from_utf8(local)?.to_string();
    match resolved {
        ResolveResult::Bound(ns) => {
            let ns = std::str::from_utf8(ns.into_inner())?.to_string();
            let next_index = prefixes.len();
            let prefix = prefixes
                .entry(ns.clone())
                .or_insert_with(|| format!("ns{next_index}"))
                .clone();
            Ok(QName::with_ns(ns, local, prefix))
        }
        ResolveResult::Unbound | ResolveResult::Unknown(_) => Ok(QName::local(local)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_with_attributes_and_text() {
        let xml = br#"<root a="1"><child>hello</child></root>"#;
        let tree = parse(xml, WhitespaceMode::None).unwrap();
        let root = tree.node(tree.root());
        assert_eq!(root.tag.display(), "root");
        assert_eq!(root.attributes.get(&QName::local("a")), Some(&"1".to_string()));
        assert_eq!(root.children.len(), 1);

        let child = tree.node(root.children[0]);
        assert_eq!(child.tag.display(), "child");
        assert_eq!(child.text.as_deref(), Some("hello"));
    }

    #[test]
    fn tail_text_is_attached_to_preceding_sibling() {
        let xml = br#"<root><a/>tail text<b/></root>"#;
        let tree = parse(xml, WhitespaceMode::None).unwrap();
        let root = tree.node(tree.root());
        let a = tree.node(root.children[0]);
        assert_eq!(a.tail.as_deref(), Some("tail text"));
    }

    #[test]
    fn empty_elements_parse_without_children() {
        let xml = br#"<root><leaf/></root>"#;
        let tree = parse(xml, WhitespaceMode::None).unwrap();
        let root = tree.node(tree.root());
        assert_eq!(root.children.len(), 1);
        assert!(tree.node(root.children[0]).children.is_empty());
    }

    #[test]
    fn namespaced_elements_resolve_to_qualified_names() {
        let xml = br#"<root xmlns:x="urn:example"><x:child/></root>"#;
        let tree = parse(xml, WhitespaceMode::None).unwrap();
        let root = tree.node(tree.root());
        let child = tree.node(root.children[0]);
        assert_eq!(child.tag.ns.as_deref(), Some("urn:example"));
        assert_eq!(child.tag.local, "child");
    }

    #[test]
    fn unclosed_element_is_malformed() {
        let xml = br#"<root><a></root>"#;
        assert!(parse(xml, WhitespaceMode::None).is_err());
    }

    #[test]
    fn whitespace_only_text_dropped_under_tags_mode() {
        let xml = b"<root>\n  <a/>\n  <b/>\n</root>";
        let tree = parse(xml, WhitespaceMode::Tags).unwrap();
        let root = tree.node(tree.root());
        assert_eq!(root.text, None);
        let a = tree.node(root.children[0]);
        assert_eq!(a.tail, None);
    }
}
