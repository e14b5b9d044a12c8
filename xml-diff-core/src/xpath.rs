//! Canonical XPath construction and resolution.

use crate::node::{NodeId, Tree};

/// Build the canonical XPath of `id` within `tree`: `/q1[i1]/q2[i2]/...`,
/// where each `ik` is the 1-based position of that ancestor among its
/// parent's children sharing the same qualified tag. The `[1]` predicate is
/// always included, even when a node is unambiguous without it, so
/// downstream lookups are uniform (per §4.1).
pub fn canonical_xpath(tree: &Tree, id: NodeId) -> String {
    let mut segments = Vec::new();
    let mut current = Some(id);
    while let Some(node_id) = current {
        let node = tree.node(node_id);
        let parent = node.parent;
        let tag_str = node.tag.display();
        let index = match parent {
            Some(p) => {
                tree.node(p)
                    .children
                    .iter()
                    .filter(|&&c| tree.node(c).tag == node.tag)
                    .position(|&c| c == node_id)
                    .unwrap_or(0)
                    + 1
            }
            None => 1,
        };
        segments.push(format!("{tag_str}[{index}]"));
        current = parent;
    }
    segments.reverse();
    format!("/{}", segments.join("/"))
}

/// Parse one `tag[index]` xpath segment into its tag string and 1-based index.
fn parse_segment(seg: &str) -> Option<(&str, usize)> {
    let open = seg.find('[')?;
    let close = seg.find(']')?;
    if close <= open {
        return None;
    }
    let tag = &seg[..open];
    let index: usize = seg[open + 1..close].parse().ok()?;
    Some((tag, index))
}

/// Resolve a canonical xpath (as produced by [`canonical_xpath`]) back to a
/// node, counting only children for which `alive` is true when computing a
/// segment's `[index]` position. Passing `|_| true` matches every present
/// child, which is correct as long as the tree mirrors the state
/// [`canonical_xpath`] was originally computed against; callers that keep
/// logically-deleted nodes physically present (e.g. the annotating
/// formatter) pass a predicate that excludes them, so that later siblings'
/// positions still line up with the xpath strings captured earlier.
pub fn resolve_xpath(tree: &Tree, xpath: &str, alive: impl Fn(&Tree, NodeId) -> bool) -> Option<NodeId> {
    let rest = xpath.strip_prefix('/')?;
    let mut segments = rest.split('/');

    let (root_tag, _) = parse_segment(segments.next()?)?;
    let mut current = tree.root();
    if tree.node(current).tag.display() != root_tag {
        return None;
    }

    for seg in segments {
        let (tag, index) = parse_segment(seg)?;
        let mut count = 0;
        let mut found = None;
        for &child in &tree.node(current).children {
            if !alive(tree, child) {
                continue;
            }
            if tree.node(child).tag.display() == tag {
                count += 1;
                if count == index {
                    found = Some(child);
                    break;
                }
            }
        }
        current = found?;
    }
    Some(current)
}
