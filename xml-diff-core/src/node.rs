//! Arena-backed XML tree.
//!
//! Nodes live in a flat `Vec` and are addressed by [`NodeId`], a stable
//! numeric handle. This gives the matcher and edit-script generator the
//! node-identity semantics the reference implementation gets for free from
//! `id(node)` on a garbage-collected runtime, and lets [`Tree`] derive
//! `Clone` cheaply (indices stay valid across a clone, whereas pointers
//! would not) — which is exactly the "clone before mutating" discipline the
//! annotating formatter relies on.

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::Serialize;

/// A stable handle identifying a node within one [`Tree`].
///
/// `NodeId`s from different trees are not interchangeable even if they
/// happen to hold the same numeric value.
pub type NodeId = usize;

/// A qualified XML name: a resolved namespace URI plus a local name.
///
/// Two `QName`s are equal (and hash equally) purely on `(ns, local)`, as the
/// spec requires for node-tag comparison; `prefix` is carried along only so
/// the writer and XPath builder can round-trip a human-readable prefix, and
/// never participates in identity.
#[derive(Debug, Clone, Serialize)]
pub struct QName {
    /// Resolved namespace URI, if any.
    pub ns: Option<String>,
    /// Local (unprefixed) name.
    pub local: String,
    /// Prefix used at parse time (or assigned for serialization), for display only.
    pub prefix: Option<String>,
}

impl QName {
    /// Build a qname with no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            ns: None,
            local: local.into(),
            prefix: None,
        }
    }

    /// Build a qname in a given namespace, with a preferred serialization prefix.
    pub fn with_ns(ns: impl Into<String>, local: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            ns: Some(ns.into()),
            local: local.into(),
            prefix: Some(prefix.into()),
        }
    }

    /// The qualified string form used in canonical XPaths and serialized XML:
    /// `prefix:local` if a prefix is known, else just `local`.
    pub fn display(&self) -> String {
        match &self.prefix {
            Some(p) if !p.is_empty() => format!("{p}:{}", self.local),
            _ => self.local.clone(),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.ns == other.ns && self.local == other.local
    }
}
impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ns.hash(state);
        self.local.hash(state);
    }
}

impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.ns, &self.local).cmp(&(&other.ns, &other.local))
    }
}

/// A node in an XML tree.
///
/// The `parent` field is a back-reference for traversal; it does not imply
/// ownership. The arena (`Tree`) owns every node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Qualified element tag.
    pub tag: QName,
    /// Ordered, unique attribute map (insertion order preserved).
    pub attributes: IndexMap<QName, String>,
    /// Leading text content of the element, if any.
    pub text: Option<String>,
    /// Text that follows this element within its parent's content, if any.
    pub tail: Option<String>,
    /// Parent node, if this is not the tree root.
    pub parent: Option<NodeId>,
    /// Ordered child element handles.
    pub children: Vec<NodeId>,
}

impl Node {
    /// Create a childless, textless, attribute-less node with the given tag.
    pub fn new(tag: QName) -> Self {
        Self {
            tag,
            attributes: IndexMap::new(),
            text: None,
            tail: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// A tree-shaped element snapshot that lives outside any [`Tree`] arena.
///
/// Used by the placeholder substitution pass to carry a whole removed
/// element (or an empty tag "shell", for formatting open/close markers)
/// until it is grafted back into a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedNode {
    pub tag: QName,
    pub attributes: IndexMap<QName, String>,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<DetachedNode>,
}

/// An arena of [`Node`]s plus a designated root.
///
/// `Tree` derives `Clone`: since nodes are addressed by index rather than by
/// pointer, cloning the arena produces an independent tree where every
/// `NodeId` still resolves to the corresponding (cloned) node. This is what
/// lets the annotating formatter clone the whole left tree cheaply before
/// mutating it.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    arena: Vec<Node>,
    root: NodeId,
    /// Namespace URI -> preferred serialization prefix, accumulated while
    /// parsing (from `xmlns:*` declarations) and extendable by formatters
    /// that need to register new namespaces (e.g. the diff namespace).
    pub prefixes: IndexMap<String, String>,
}

impl Tree {
    /// Build a tree whose arena contains only `root_node`, at index 0.
    pub fn new(root_node: Node) -> Self {
        Self {
            arena: vec![root_node],
            root: 0,
            prefixes: IndexMap::new(),
        }
    }

    /// Build a tree from an already-populated arena and a designated root,
    /// e.g. once a parser has finished allocating nodes bottom-up.
    pub(crate) fn from_parts(arena: Vec<Node>, root: NodeId) -> Self {
        Self {
            arena,
            root,
            prefixes: IndexMap::new(),
        }
    }

    /// The root node's handle.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow a node by handle.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    /// Mutably borrow a node by handle.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.arena[id]
    }

    /// Number of live (allocated) nodes, including detached ones still in the arena.
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// Allocate a new, parentless, childless node and return its handle.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.arena.push(node);
        self.arena.len() - 1
    }

    /// Attach `child` to `parent`'s children at `position`, setting `child`'s
    /// parent pointer. Does not check whether `child` was already attached
    /// elsewhere; callers that move a node must `detach` it first.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId, position: usize) {
        let position = position.min(self.arena[parent].children.len());
        self.arena[parent].children.insert(position, child);
        self.arena[child].parent = Some(parent);
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let position = self.arena[parent].children.len();
        self.attach_child(parent, child, position);
    }

    /// Remove `child` from its parent's child list. The node remains
    /// allocated in the arena (unreachable from the root) but its handle
    /// stays valid for any edit-script bookkeeping that still needs it.
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.arena[child].parent.take() {
            self.arena[parent].children.retain(|&c| c != child);
        }
    }

    /// This node's 0-based index among its parent's children, if it has a parent.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.arena[id].parent?;
        self.arena[parent].children.iter().position(|&c| c == id)
    }

    /// Copy the subtree rooted at `id` out of the arena entirely, as a
    /// free-standing [`DetachedNode`]. Used by the placeholder substitution
    /// pass to pull a whole element out of the tree while it is represented
    /// only as a private-use character in its former parent's text.
    pub fn extract(&self, id: NodeId) -> DetachedNode {
        let node = &self.arena[id];
        DetachedNode {
            tag: node.tag.clone(),
            attributes: node.attributes.clone(),
            text: node.text.clone(),
            tail: None,
            children: node.children.iter().map(|&c| self.extract(c)).collect(),
        }
    }

    /// Allocate `detached` (and its descendants) into this tree's arena and
    /// attach the new root as a child of `parent` at `position`. Returns the
    /// new root's handle.
    pub fn graft(&mut self, parent: NodeId, detached: &DetachedNode, position: usize) -> NodeId {
        let mut node = Node::new(detached.tag.clone());
        node.attributes = detached.attributes.clone();
        node.text = detached.text.clone();
        node.tail = detached.tail.clone();
        let id = self.alloc(node);
        self.attach_child(parent, id, position);
        for (i, child) in detached.children.iter().enumerate() {
            self.graft(id, child, i);
        }
        id
    }

    /// Deep-clone the subtree rooted at `id` into fresh arena slots of this
    /// same tree, returning the handle of the new (parentless) root. Used by
    /// the annotating formatter to duplicate a moved node in place.
    pub fn deep_clone_subtree(&mut self, id: NodeId) -> NodeId {
        let children: Vec<NodeId> = self.arena[id].children.clone();
        let mut copy = Node::new(self.arena[id].tag.clone());
        copy.attributes = self.arena[id].attributes.clone();
        copy.text = self.arena[id].text.clone();
        copy.tail = self.arena[id].tail.clone();
        let new_id = self.alloc(copy);
        for child in children {
            let new_child = self.deep_clone_subtree(child);
            self.append_child(new_id, new_child);
        }
        new_id
    }

    /// Post-order traversal (children before parent) of the subtree at `root`.
    pub fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.post_order_into(root, &mut out);
        out
    }

    fn post_order_into(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.arena[id].children {
            self.post_order_into(child, out);
        }
        out.push(id);
    }

    /// Reverse post-order traversal (right-to-left siblings) of the subtree at `root`.
    pub fn reverse_post_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.reverse_post_order_into(root, &mut out);
        out
    }

    fn reverse_post_order_into(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.arena[id].children.iter().rev() {
            self.reverse_post_order_into(child, out);
        }
        out.push(id);
    }

    /// Breadth-first traversal (root first, then level by level) of the subtree at `root`.
    pub fn breadth_first(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = vec![root];
        let mut frontier = vec![root];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in frontier {
                next.extend(self.arena[id].children.iter().copied());
            }
            out.extend(next.iter().copied());
            frontier = next;
        }
        out
    }
}
