//! Placeholder substitution: temporarily replaces structured child elements
//! with single private-use-area characters so that running text (and its
//! inline formatting tags) can participate in ordinary character-level text
//! diffing, then reverses the substitution once the diff is applied.

use rustc_hash::FxHashMap;

use crate::node::{DetachedNode, NodeId, QName, Tree};

/// The namespace of the synthetic `insert`/`delete` wrapper shells used to
/// mark up text-level diff spans that fall inside already-placeholdered content.
pub const DIFF_NAMESPACE: &str = "http://namespaces.shoobx.com/diff";

/// First private-use codepoint handed out; matches the reference's choice of
/// the start of the largest private-use block in the Unicode space.
const FIRST_CODEPOINT: u32 = 0xF0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    Open,
    Close,
    Single,
}

#[derive(Debug, Clone)]
struct PlaceholderEntry {
    content: DetachedNode,
    kind: PlaceholderKind,
    paired_close: Option<char>,
}

/// One fragment of reconstructed content: either literal text, or a fully
/// resolved element (with its own tail already attached).
#[derive(Debug, Clone)]
enum Fragment {
    Text(String),
    Element(DetachedNode),
}

/// Replaces (and later restores) structured content with placeholder
/// characters, scoped to a configured set of "text tag" container elements
/// and "formatting tag" inline elements.
pub struct PlaceholderMaker {
    text_tags: Vec<QName>,
    formatting_tags: Vec<QName>,
    placeholder_to_entry: FxHashMap<char, PlaceholderEntry>,
    dedup: FxHashMap<(String, PlaceholderKind, Option<char>), char>,
    next_codepoint: u32,
    pub insert_tags: (char, char),
    pub delete_tags: (char, char),
}

impl PlaceholderMaker {
    pub fn new(text_tags: Vec<QName>, formatting_tags: Vec<QName>) -> Self {
        let mut maker = Self {
            text_tags,
            formatting_tags,
            placeholder_to_entry: FxHashMap::default(),
            dedup: FxHashMap::default(),
            next_codepoint: FIRST_CODEPOINT,
            insert_tags: ('\u{0}', '\u{0}'),
            delete_tags: ('\u{0}', '\u{0}'),
        };

        let insert_shell = shell(QName::with_ns(DIFF_NAMESPACE, "insert", "diff"));
        let insert_close = maker.get_placeholder(insert_shell.clone(), PlaceholderKind::Close, None);
        let insert_open = maker.get_placeholder(insert_shell, PlaceholderKind::Open, Some(insert_close));
        maker.insert_tags = (insert_open, insert_close);

        let delete_shell = shell(QName::with_ns(DIFF_NAMESPACE, "delete", "diff"));
        let delete_close = maker.get_placeholder(delete_shell.clone(), PlaceholderKind::Close, None);
        let delete_open = maker.get_placeholder(delete_shell, PlaceholderKind::Open, Some(delete_close));
        maker.delete_tags = (delete_open, delete_close);

        maker
    }

    fn get_placeholder(&mut self, content: DetachedNode, kind: PlaceholderKind, paired_close: Option<char>) -> char {
        let key = (content_key(&content), kind, paired_close);
        if let Some(&ph) = self.dedup.get(&key) {
            return ph;
        }
        self.next_codepoint += 1;
        let ph = char::from_u32(self.next_codepoint).expect("private-use codepoints stay in range");
        self.placeholder_to_entry.insert(ph, PlaceholderEntry { content, kind, paired_close });
        self.dedup.insert(key, ph);
        ph
    }

    pub fn is_placeholder(&self, c: char) -> bool {
        self.placeholder_to_entry.contains_key(&c)
    }

    /// The kind of a known placeholder character, if any.
    pub fn kind_of(&self, ph: char) -> Option<PlaceholderKind> {
        self.placeholder_to_entry.get(&ph).map(|e| e.kind)
    }

    /// An open placeholder's matching close character, if any.
    pub fn paired_close_of(&self, ph: char) -> Option<char> {
        self.placeholder_to_entry.get(&ph).and_then(|e| e.paired_close)
    }

    fn is_formatting(&self, tag: &QName) -> bool {
        self.formatting_tags.contains(tag)
    }

    /// Split `text` into a sequence of single-placeholder-character strings
    /// and maximal runs of ordinary text.
    pub fn split_string(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut run = String::new();
        for c in text.chars() {
            if self.is_placeholder(c) {
                if !run.is_empty() {
                    out.push(std::mem::take(&mut run));
                }
                out.push(c.to_string());
            } else {
                run.push(c);
            }
        }
        if !run.is_empty() {
            out.push(run);
        }
        out
    }

    /// Replace every text-tag element's direct children with placeholders,
    /// recursively resolving formatting descendants into the same run of text.
    pub fn do_tree(&mut self, tree: &mut Tree) {
        if self.text_tags.is_empty() {
            return;
        }
        let targets: Vec<NodeId> = tree
            .breadth_first(tree.root())
            .into_iter()
            .filter(|&id| self.text_tags.contains(&tree.node(id).tag))
            .collect();
        for id in targets {
            self.do_element(tree, id);
        }
    }

    fn do_element(&mut self, tree: &mut Tree, element: NodeId) {
        let children: Vec<NodeId> = tree.node(element).children.clone();
        let mut new_text = tree.node(element).text.clone().unwrap_or_default();

        for &child in &children {
            let tail = tree.node(child).tail.clone().unwrap_or_default();
            if self.is_formatting(&tree.node(child).tag) {
                let shell_node = shell_from(tree, child);
                let ph_close = self.get_placeholder(shell_node.clone(), PlaceholderKind::Close, None);
                let ph_open = self.get_placeholder(shell_node, PlaceholderKind::Open, Some(ph_close));

                self.do_element(tree, child);
                let inner_text = tree.node(child).text.clone().unwrap_or_default();

                new_text.push(ph_open);
                new_text.push_str(&inner_text);
                new_text.push(ph_close);
                new_text.push_str(&tail);
            } else {
                let content = tree.extract(child);
                let ph_single = self.get_placeholder(content, PlaceholderKind::Single, None);
                new_text.push(ph_single);
                new_text.push_str(&tail);
            }
        }

        tree.node_mut(element).text = if new_text.is_empty() { None } else { Some(new_text) };
        for &child in &children {
            tree.detach(child);
        }
    }

    /// Take a placeholder produced for an insert/delete action's content and
    /// mint a new placeholder for a copy wrapped with the diff annotation,
    /// returning the new character (open/close characters pass through
    /// unchanged, matching the reference's "nothing to mark on close" rule).
    pub fn mark_diff(&mut self, ph: char, action: &str) -> char {
        let entry = self.placeholder_to_entry.get(&ph).expect("known placeholder").clone();
        if entry.kind == PlaceholderKind::Close {
            return ph;
        }

        let mut content = entry.content.clone();
        if self.is_formatting(&content.tag) {
            let attr = QName::with_ns(DIFF_NAMESPACE, format!("{action}-formatting"), "diff");
            content.attributes.insert(attr, String::new());
        } else {
            let (open, close) = self.wrap_diff_chars(action);
            let mut text = String::new();
            text.push(open);
            text.push_str(content.text.as_deref().unwrap_or_default());
            text.push(close);
            content.text = Some(text);
        }

        self.get_placeholder(content, entry.kind, entry.paired_close)
    }

    fn wrap_diff_chars(&self, action: &str) -> (char, char) {
        match action {
            "insert" => self.insert_tags,
            "delete" => self.delete_tags,
            _ => unreachable!("action is always \"insert\" or \"delete\""),
        }
    }

    /// Wrap a plain (non-placeholder) text run with the insert/delete marker
    /// placeholders, for splicing into a node's running text.
    pub fn wrap_diff(&self, text: &str, action: &str) -> String {
        let (open, close) = self.wrap_diff_chars(action);
        format!("{open}{text}{close}")
    }

    /// Reverse every remaining placeholder substitution in `tree`, restoring
    /// real elements.
    pub fn undo_tree(&self, tree: &mut Tree) {
        if self.placeholder_to_entry.is_empty() {
            return;
        }
        self.undo_element(tree, tree.root());
    }

    fn undo_element(&self, tree: &mut Tree, id: NodeId) {
        if let Some(text) = tree.node(id).text.clone() {
            if text.chars().any(|c| self.is_placeholder(c)) {
                let fragments = self.undo_string(&text);
                let (lead, children) = fragments_to_parts(fragments);
                tree.node_mut(id).text = lead;
                for (i, child) in children.iter().enumerate() {
                    let mut for_graft = child.clone();
                    let tail = for_graft.tail.take();
                    let child_id = tree.graft(id, &for_graft, i);
                    tree.node_mut(child_id).tail = tail;
                }
            }
        }

        let existing: Vec<NodeId> = tree.node(id).children.clone();
        for child in existing {
            self.undo_element(tree, child);
        }

        if let Some(tail) = tree.node(id).tail.clone() {
            if tail.chars().any(|c| self.is_placeholder(c)) {
                let fragments = self.undo_string(&tail);
                let (lead, children) = fragments_to_parts(fragments);
                tree.node_mut(id).tail = lead;
                let Some(parent) = tree.node(id).parent else { return };
                let mut pos = tree.index_in_parent(id).map(|i| i + 1).unwrap_or(0);
                for child in &children {
                    let mut for_graft = child.clone();
                    let grafted_tail = for_graft.tail.take();
                    let child_id = tree.graft(parent, &for_graft, pos);
                    tree.node_mut(child_id).tail = grafted_tail;
                    pos += 1;
                }
            }
        }
    }

    fn undo_string(&self, text: &str) -> Vec<Fragment> {
        let segments = self.split_string(text);
        let mut fragments = Vec::new();
        let mut iter = segments.into_iter().peekable();

        while let Some(seg) = iter.next() {
            let single_char = seg.chars().count() == 1 && self.is_placeholder(seg.chars().next().unwrap());
            if !single_char {
                fragments.push(Fragment::Text(seg));
                continue;
            }

            let ph = seg.chars().next().unwrap();
            let entry = self.placeholder_to_entry.get(&ph).expect("known placeholder").clone();
            match entry.kind {
                PlaceholderKind::Single => fragments.push(Fragment::Element(entry.content)),
                PlaceholderKind::Close => {} // consumed by its matching Open below; stray closes are dropped
                PlaceholderKind::Open => {
                    let mut inner = String::new();
                    for next_seg in iter.by_ref() {
                        if next_seg.chars().count() == 1 {
                            let c = next_seg.chars().next().unwrap();
                            if Some(c) == entry.paired_close {
                                break;
                            }
                        }
                        inner.push_str(&next_seg);
                    }
                    let inner_fragments = self.undo_string(&inner);
                    let (inner_text, inner_children) = fragments_to_parts(inner_fragments);
                    let mut content = entry.content;
                    content.text = inner_text;
                    content.children = inner_children;
                    fragments.push(Fragment::Element(content));
                }
            }
        }

        fragments
    }
}

fn shell(tag: QName) -> DetachedNode {
    DetachedNode {
        tag,
        attributes: indexmap::IndexMap::new(),
        text: None,
        tail: None,
        children: Vec::new(),
    }
}

fn shell_from(tree: &Tree, id: NodeId) -> DetachedNode {
    let node = tree.node(id);
    DetachedNode {
        tag: node.tag.clone(),
        attributes: node.attributes.clone(),
        text: None,
        tail: None,
        children: Vec::new(),
    }
}

fn content_key(node: &DetachedNode) -> String {
    let mut key = node.tag.display();
    for (k, v) in &node.attributes {
        key.push(' ');
        key.push_str(&k.display());
        key.push('=');
        key.push_str(v);
    }
    if let Some(t) = &node.text {
        key.push('|');
        key.push_str(t);
    }
    for child in &node.children {
        key.push('{');
        key.push_str(&content_key(child));
        key.push('}');
    }
    key
}

fn fragments_to_parts(fragments: Vec<Fragment>) -> (Option<String>, Vec<DetachedNode>) {
    let mut lead = String::new();
    let mut children: Vec<DetachedNode> = Vec::new();

    for frag in fragments {
        match frag {
            Fragment::Text(t) => match children.last_mut() {
                Some(last) => {
                    let existing = last.tail.get_or_insert_with(String::new);
                    existing.push_str(&t);
                }
                None => lead.push_str(&t),
            },
            Fragment::Element(e) => children.push(e),
        }
    }

    (if lead.is_empty() { None } else { Some(lead) }, children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn formatting_tag() -> QName {
        QName::local("b")
    }

    fn text_tag() -> QName {
        QName::local("p")
    }

    #[test]
    fn single_child_becomes_one_placeholder_in_parent_text() {
        let mut tree = Tree::new(Node::new(text_tag()));
        let img = tree.alloc(Node::new(QName::local("img")));
        tree.append_child(tree.root(), img);
        tree.node_mut(tree.root()).text = Some("before ".to_string());
        tree.node_mut(img).tail = Some(" after".to_string());

        let mut maker = PlaceholderMaker::new(vec![text_tag()], vec![formatting_tag()]);
        maker.do_tree(&mut tree);

        let text = tree.node(tree.root()).text.clone().unwrap();
        assert!(text.starts_with("before "));
        assert!(text.ends_with(" after"));
        assert!(tree.node(tree.root()).children.is_empty());
    }

    #[test]
    fn formatting_child_round_trips_through_placeholders() {
        let mut tree = Tree::new(Node::new(text_tag()));
        let bold = tree.alloc(Node::new(formatting_tag()));
        tree.node_mut(bold).text = Some("bold text".to_string());
        tree.append_child(tree.root(), bold);
        tree.node_mut(tree.root()).text = Some("plain ".to_string());

        let mut maker = PlaceholderMaker::new(vec![text_tag()], vec![formatting_tag()]);
        maker.do_tree(&mut tree);
        assert!(tree.node(tree.root()).children.is_empty());

        maker.undo_tree(&mut tree);
        let root = tree.node(tree.root());
        assert_eq!(root.text.as_deref(), Some("plain "));
        assert_eq!(root.children.len(), 1);
        let restored = tree.node(root.children[0]);
        assert_eq!(restored.tag, formatting_tag());
        assert_eq!(restored.text.as_deref(), Some("bold text"));
    }

    #[test]
    fn wrap_diff_brackets_text_with_insert_markers() {
        let maker = PlaceholderMaker::new(vec![text_tag()], vec![formatting_tag()]);
        let wrapped = maker.wrap_diff("hello", "insert");
        assert!(wrapped.chars().next().unwrap() == maker.insert_tags.0);
        assert!(wrapped.chars().last().unwrap() == maker.insert_tags.1);
    }

    #[test]
    fn identical_single_children_share_a_placeholder() {
        let mut tree = Tree::new(Node::new(text_tag()));
        let a = tree.alloc(Node::new(QName::local("img")));
        let b = tree.alloc(Node::new(QName::local("img")));
        tree.append_child(tree.root(), a);
        tree.append_child(tree.root(), b);

        let mut maker = PlaceholderMaker::new(vec![text_tag()], vec![]);
        maker.do_tree(&mut tree);

        let text = tree.node(tree.root()).text.clone().unwrap();
        let chars: Vec<char> = text.chars().collect();
        assert_eq!(chars.len(), 2);
        assert_eq!(chars[0], chars[1]);
    }
}
