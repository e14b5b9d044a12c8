//! The annotating formatter: replays an edit script onto a clone of the
//! pre-diff left tree, producing a single tree carrying `diff:*` markup
//! instead of a separate list of operations.

use crate::edit::EditOperation;
use crate::error::DiffError;
use crate::node::{Node, NodeId, QName, Tree};
use crate::parser::WhitespaceMode;
use crate::placeholder::{PlaceholderKind, PlaceholderMaker, DIFF_NAMESPACE};
use crate::textdiff::{diff_text, TextOp};
use crate::xpath::resolve_xpath;

/// Tunables for the annotating formatter: whitespace handling plus the
/// placeholder pass's tag configuration.
#[derive(Debug, Clone)]
pub struct FormatterOptions {
    /// Whitespace normalization applied when the trees were parsed; carried
    /// here only so callers have one options bag to pass around.
    pub normalize: WhitespaceMode,
    /// Whether the final serialization should be pretty-printed.
    pub pretty_print: bool,
    /// Block-like elements whose inline content is collapsed to a single
    /// text run for the purposes of diffing (empty disables this entirely).
    pub text_tags: Vec<QName>,
    /// Inline tags within `text_tags` content whose open/close boundaries
    /// should still participate in text diffing.
    pub formatting_tags: Vec<QName>,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            normalize: WhitespaceMode::None,
            pretty_print: true,
            text_tags: Vec::new(),
            formatting_tags: Vec::new(),
        }
    }
}

/// Applies an edit script to a tree, producing `diff:*`-annotated markup.
pub struct AnnotatingFormatter {
    options: FormatterOptions,
    maker: PlaceholderMaker,
}

impl AnnotatingFormatter {
    pub fn new(options: FormatterOptions) -> Self {
        let maker = PlaceholderMaker::new(options.text_tags.clone(), options.formatting_tags.clone());
        Self { options, maker }
    }

    /// Pre-diff hook: substitutes inline structured content with private-use
    /// placeholders on both trees, so the text differ can see across tag
    /// boundaries. A no-op when no `text_tags` are configured.
    pub fn prepare(&mut self, left: &mut Tree, right: &mut Tree) {
        self.maker.do_tree(left);
        self.maker.do_tree(right);
    }

    /// Replay `ops` against a fresh clone of `orig_left`, returning the
    /// annotated tree. `ops` must have been captured against `orig_left`'s
    /// own progressively-mutated state (i.e. the tree passed to
    /// [`crate::edit::generate_edit_script`] before it ran).
    pub fn format(&mut self, ops: &[EditOperation], orig_left: &Tree) -> Result<Tree, DiffError> {
        let mut tree = orig_left.clone();
        register_diff_namespace(&mut tree);

        let mut deferred = Vec::new();
        for op in ops {
            match op {
                EditOperation::UpdateTextIn { .. } | EditOperation::UpdateTextAfter { .. } => {
                    deferred.push(op);
                }
                _ => self.apply(&mut tree, op)?,
            }
        }
        for op in deferred.into_iter().rev() {
            self.apply(&mut tree, op)?;
        }

        if !self.options.text_tags.is_empty() {
            self.maker.undo_tree(&mut tree);
        }
        Ok(tree)
    }

    fn apply(&mut self, tree: &mut Tree, op: &EditOperation) -> Result<(), DiffError> {
        match op {
            EditOperation::DeleteAttrib { node, name } => {
                let id = resolve(tree, node)?;
                tree.node_mut(id).attributes.shift_remove(name);
                extend_diff_attr(tree, id, "delete-attr", &name.display());
            }
            EditOperation::DeleteNode { node } => {
                let id = resolve(tree, node)?;
                mark_delete(tree, id);
            }
            EditOperation::InsertAttrib { node, name, value } => {
                let id = resolve(tree, node)?;
                tree.node_mut(id).attributes.insert(name.clone(), value.clone());
                extend_diff_attr(tree, id, "add-attr", &name.display());
            }
            EditOperation::InsertNode { target, tag, position } => {
                let target_id = resolve(tree, target)?;
                let mut node = Node::new(tag.clone());
                node.attributes.insert(diff_qname("insert"), String::new());
                let child_id = tree.alloc(node);
                let idx = effective_insert_index(tree, target_id, *position);
                tree.attach_child(target_id, child_id, idx);
            }
            EditOperation::RenameAttrib { node, old_name, new_name } => {
                let id = resolve(tree, node)?;
                let value = tree.node_mut(id).attributes.shift_remove(old_name).unwrap_or_default();
                tree.node_mut(id).attributes.insert(new_name.clone(), value);
                extend_diff_attr(
                    tree,
                    id,
                    "rename-attr",
                    &format!("{}:{}", old_name.display(), new_name.display()),
                );
            }
            EditOperation::UpdateAttrib { node, name, value } => {
                let id = resolve(tree, node)?;
                let old_value = tree.node(id).attributes.get(name).cloned().unwrap_or_default();
                tree.node_mut(id).attributes.insert(name.clone(), value.clone());
                extend_diff_attr(tree, id, "update-attr", &format!("{}:{}", name.display(), old_value));
            }
            EditOperation::MoveNode { node, target, position } => {
                let src = resolve(tree, node)?;
                let cloned = tree.deep_clone_subtree(src);
                tree.node_mut(cloned).attributes.insert(diff_qname("insert"), String::new());
                let target_id = resolve(tree, target)?;
                mark_delete(tree, src);
                let idx = effective_insert_index(tree, target_id, *position);
                tree.attach_child(target_id, cloned, idx);
            }
            EditOperation::UpdateTextIn { node, text } => {
                let id = resolve(tree, node)?;
                let old = tree.node(id).text.clone().unwrap_or_default();
                let rendered = self.make_diff_tags(&old, text.as_deref().unwrap_or(""));
                tree.node_mut(id).text = if rendered.is_empty() { None } else { Some(rendered) };
            }
            EditOperation::UpdateTextAfter { node, text } => {
                let id = resolve(tree, node)?;
                let old = tree.node(id).tail.clone().unwrap_or_default();
                let rendered = self.make_diff_tags(&old, text.as_deref().unwrap_or(""));
                tree.node_mut(id).tail = if rendered.is_empty() { None } else { Some(rendered) };
            }
        }
        Ok(())
    }

    /// Character-diff `left_value` against `right_value`, realign the
    /// placeholder-bearing segments so open/close pairs stay nested, then
    /// render equal runs as-is and delete/insert runs wrapped (or, for a
    /// lone placeholder, marked in place via [`PlaceholderMaker::mark_diff`]).
    fn make_diff_tags(&mut self, left_value: &str, right_value: &str) -> String {
        let pairs: Vec<(TextOp, String)> = diff_text(left_value, right_value)
            .into_iter()
            .map(|s| (s.op, s.text))
            .collect();
        let realigned = self.realign_placeholders(pairs);

        let mut out = String::new();
        for (op, text) in realigned {
            match op {
                TextOp::Equal => out.push_str(&text),
                TextOp::Delete | TextOp::Insert => {
                    let action = if op == TextOp::Insert { "insert" } else { "delete" };
                    match lone_placeholder(&text, &self.maker) {
                        Some(c) => out.push(self.maker.mark_diff(c, action)),
                        None => out.push_str(&self.maker.wrap_diff(&text, action)),
                    }
                }
            }
        }
        out
    }

    /// Fix up closing-tag placeholders that a character-level diff can
    /// reorder relative to their opening tag, by tracking a stack of
    /// currently-open placeholders and force-closing any that are still open
    /// when an unrelated close is encountered.
    fn realign_placeholders(&self, diff: Vec<(TextOp, String)>) -> Vec<(TextOp, String)> {
        let mut new_diff: Vec<(TextOp, String)> = Vec::new();
        let mut stack: Vec<(TextOp, char)> = Vec::new();

        for (op, text) in diff {
            let mut new_text = String::new();
            for seg in self.maker.split_string(&text) {
                if seg.is_empty() {
                    continue;
                }
                let Some(ph) = lone_placeholder(&seg, &self.maker) else {
                    new_text.push_str(&seg);
                    continue;
                };
                match self.maker.kind_of(ph).expect("split_string only yields known placeholders") {
                    PlaceholderKind::Single => new_text.push(ph),
                    PlaceholderKind::Open => {
                        stack.push((op.clone(), ph));
                        new_text.push(ph);
                    }
                    PlaceholderKind::Close => {
                        let mut popped = stack.pop();
                        loop {
                            match &popped {
                                Some((_, open_ph)) if self.maker.paired_close_of(*open_ph) == Some(ph) => break,
                                Some((stack_op, open_ph)) => {
                                    if let Some(close) = self.maker.paired_close_of(*open_ph) {
                                        new_diff.push((stack_op.clone(), close.to_string()));
                                    }
                                    popped = stack.pop();
                                }
                                None => break,
                            }
                        }
                        if popped.is_some() {
                            new_text.push(ph);
                        }
                    }
                }
            }
            if !new_text.is_empty() {
                new_diff.push((op, new_text));
            }
        }
        new_diff
    }
}

fn lone_placeholder(text: &str, maker: &PlaceholderMaker) -> Option<char> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if chars.next().is_none() && maker.is_placeholder(first) {
        Some(first)
    } else {
        None
    }
}

fn diff_qname(local: &str) -> QName {
    QName::with_ns(DIFF_NAMESPACE, local, "diff")
}

fn is_deleted(tree: &Tree, id: NodeId) -> bool {
    tree.node(id).attributes.contains_key(&diff_qname("delete"))
}

fn mark_delete(tree: &mut Tree, id: NodeId) {
    tree.node_mut(id).attributes.insert(diff_qname("delete"), String::new());
}

fn extend_diff_attr(tree: &mut Tree, id: NodeId, suffix: &str, value: &str) {
    let key = diff_qname(suffix);
    let node = tree.node_mut(id);
    let existing = node.attributes.get(&key).cloned().unwrap_or_default();
    let combined = if existing.is_empty() { value.to_string() } else { format!("{existing};{value}") };
    node.attributes.insert(key, combined);
}

/// The insertion index among `target`'s *current* children that corresponds
/// to `position` in the right tree's numbering, which counts only
/// not-yet-deleted children; children already marked `diff:delete` are kept
/// in place but skipped over.
fn effective_insert_index(tree: &Tree, target: NodeId, position: usize) -> usize {
    let mut pos = 0usize;
    let mut offset = 0usize;
    for &child in &tree.node(target).children {
        if is_deleted(tree, child) {
            offset += 1;
        } else {
            pos += 1;
        }
        if pos > position {
            break;
        }
    }
    position + offset
}

fn resolve(tree: &Tree, xpath: &str) -> Result<NodeId, DiffError> {
    resolve_xpath(tree, xpath, |t, id| !is_deleted(t, id))
        .ok_or_else(|| DiffError::XPathAmbiguous { xpath: xpath.to_string(), found: 0 })
}

fn register_diff_namespace(tree: &mut Tree) {
    tree.prefixes.insert(DIFF_NAMESPACE.to_string(), "diff".to_string());
    tree.node_mut(tree.root())
        .attributes
        .insert(QName::local("xmlns:diff"), DIFF_NAMESPACE.to_string());
}
