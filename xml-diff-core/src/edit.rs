//! Edit-script generation: turns a [`Matching`] between two trees into an
//! ordered sequence of [`EditOperation`]s, mutating the left tree in place
//! as it goes so that later operations' xpaths are computed against the
//! tree state they actually apply to.

use log::debug;
use serde::Serialize;

use crate::lcs::longest_common_subsequence;
use crate::matcher::Matching;
use crate::node::{Node, NodeId, QName, Tree};
use crate::xpath::canonical_xpath;

/// One step of an edit script. `node`/`target` fields hold canonical XPaths
/// captured against the left tree at the moment the operation was emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum EditOperation {
    InsertNode {
        target: String,
        tag: QName,
        position: usize,
    },
    DeleteNode {
        node: String,
    },
    MoveNode {
        node: String,
        target: String,
        position: usize,
    },
    InsertAttrib {
        node: String,
        name: QName,
        value: String,
    },
    DeleteAttrib {
        node: String,
        name: QName,
    },
    RenameAttrib {
        node: String,
        old_name: QName,
        new_name: QName,
    },
    UpdateAttrib {
        node: String,
        name: QName,
        value: String,
    },
    UpdateTextIn {
        node: String,
        text: Option<String>,
    },
    UpdateTextAfter {
        node: String,
        text: Option<String>,
    },
}

/// Generate the full edit script transforming `left` into `right`, given an
/// already-computed [`Matching`]. Mutates `left` and `matching` as it runs:
/// inserted nodes are allocated into `left`'s arena and recorded as matches,
/// and moved/aligned nodes are physically relocated.
pub fn generate_edit_script(left: &mut Tree, right: &Tree, matching: &mut Matching) -> Vec<EditOperation> {
    let mut ops = Vec::new();

    for rnode in right.breadth_first(right.root()) {
        let rparent = right.node(rnode).parent;
        let ltarget = rparent.and_then(|rp| matching.left_of(rp));

        let ln = match matching.left_of(rnode) {
            None => {
                let pos = find_position(left, right, matching, rnode);
                let ltarget_id = ltarget
                    .expect("a non-root right node always has a matched or already-inserted parent");
                ops.push(EditOperation::InsertNode {
                    target: canonical_xpath(left, ltarget_id),
                    tag: right.node(rnode).tag.clone(),
                    position: pos,
                });

                let new_id = left.alloc(Node::new(right.node(rnode).tag.clone()));
                matching.add_match(new_id, rnode, 1.0);
                left.attach_child(ltarget_id, new_id, pos);

                ops.extend(update_node(left, right, new_id, rnode));
                new_id
            }
            Some(ln) => {
                ops.extend(update_node(left, right, ln, rnode));

                let lparent = left.node(ln).parent;
                if ltarget != lparent {
                    let pos = find_position(left, right, matching, rnode);
                    let ltarget_id = ltarget.expect("moved node always has a resolved target parent");
                    ops.push(EditOperation::MoveNode {
                        node: canonical_xpath(left, ln),
                        target: canonical_xpath(left, ltarget_id),
                        position: pos,
                    });
                    left.detach(ln);
                    left.attach_child(ltarget_id, ln, pos);
                }
                ln
            }
        };

        ops.extend(align_children(left, right, matching, ln, rnode));
    }

    for lnode in left.post_order(left.root()) {
        if matching.right_of(lnode).is_none() {
            ops.push(EditOperation::DeleteNode {
                node: canonical_xpath(left, lnode),
            });
            left.detach(lnode);
        }
    }

    debug!("generated {} edit operation(s)", ops.len());
    ops
}

/// Reconcile a matched pair's own content: text, tail, and attributes.
/// Mutates `ln` to match `rn` and returns the operations describing it.
fn update_node(left: &mut Tree, right: &Tree, ln: NodeId, rn: NodeId) -> Vec<EditOperation> {
    let mut ops = Vec::new();
    let left_xpath = canonical_xpath(left, ln);

    let rtext = right.node(rn).text.clone();
    if left.node(ln).text != rtext {
        ops.push(EditOperation::UpdateTextIn {
            node: left_xpath.clone(),
            text: rtext.clone(),
        });
        left.node_mut(ln).text = rtext;
    }

    let rtail = right.node(rn).tail.clone();
    if left.node(ln).tail != rtail {
        ops.push(EditOperation::UpdateTextAfter {
            node: left_xpath.clone(),
            text: rtail.clone(),
        });
        left.node_mut(ln).tail = rtail;
    }

    let mut common: Vec<QName> = left
        .node(ln)
        .attributes
        .keys()
        .filter(|k| right.node(rn).attributes.contains_key(*k))
        .cloned()
        .collect();
    common.sort();

    let mut new_keys: Vec<QName> = right
        .node(rn)
        .attributes
        .keys()
        .filter(|k| !left.node(ln).attributes.contains_key(*k))
        .cloned()
        .collect();

    let mut removed_keys: Vec<QName> = left
        .node(ln)
        .attributes
        .keys()
        .filter(|k| !right.node(rn).attributes.contains_key(*k))
        .cloned()
        .collect();
    removed_keys.sort();

    for key in &common {
        let rvalue = right.node(rn).attributes.get(key).unwrap().clone();
        if left.node(ln).attributes.get(key) != Some(&rvalue) {
            ops.push(EditOperation::UpdateAttrib {
                node: left_xpath.clone(),
                name: key.clone(),
                value: rvalue.clone(),
            });
            left.node_mut(ln).attributes.insert(key.clone(), rvalue);
        }
    }

    // value -> key, for attributes present only on the right; a rename shows
    // up here as an old key whose left-side value equals a new key's value.
    let mut value_to_new_key = std::collections::HashMap::new();
    for key in &new_keys {
        let value = right.node(rn).attributes.get(key).unwrap().clone();
        value_to_new_key.insert(value, key.clone());
    }

    let mut renamed = Vec::new();
    for old_key in &removed_keys {
        let value = left.node(ln).attributes.get(old_key).cloned();
        let Some(value) = value else { continue };
        if let Some(new_key) = value_to_new_key.get(&value).cloned() {
            ops.push(EditOperation::RenameAttrib {
                node: left_xpath.clone(),
                old_name: old_key.clone(),
                new_name: new_key.clone(),
            });
            left.node_mut(ln).attributes.shift_remove(old_key);
            left.node_mut(ln).attributes.insert(new_key.clone(), value);
            new_keys.retain(|k| k != &new_key);
            renamed.push(old_key.clone());
        }
    }
    removed_keys.retain(|k| !renamed.contains(k));

    new_keys.sort();
    for key in &new_keys {
        let value = right.node(rn).attributes.get(key).unwrap().clone();
        ops.push(EditOperation::InsertAttrib {
            node: left_xpath.clone(),
            name: key.clone(),
            value: value.clone(),
        });
        left.node_mut(ln).attributes.insert(key.clone(), value);
    }

    for key in &removed_keys {
        if !left.node(ln).attributes.contains_key(key) {
            continue;
        }
        ops.push(EditOperation::DeleteAttrib {
            node: left_xpath.clone(),
            name: key.clone(),
        });
        left.node_mut(ln).attributes.shift_remove(key);
    }

    ops
}

/// The insertion index, in the left parent of `rnode`'s matched-or-to-be
/// node, implied by the right tree's order of already-in-order siblings.
fn find_position(left: &Tree, right: &Tree, matching: &Matching, rnode: NodeId) -> usize {
    let Some(parent) = right.node(rnode).parent else {
        return 0;
    };
    let siblings = &right.node(parent).children;

    for &sibling in siblings {
        if matching.is_inorder_right(sibling) {
            if sibling == rnode {
                return 0;
            }
            break;
        }
    }

    let idx = siblings.iter().position(|&c| c == rnode).unwrap_or(0);
    let mut last_inorder = None;
    for &sibling in siblings[..idx].iter().rev() {
        if matching.is_inorder_right(sibling) {
            last_inorder = Some(sibling);
            break;
        }
    }

    let Some(last_inorder) = last_inorder else {
        return 0;
    };
    let Some(u) = matching.left_of(last_inorder) else {
        return 0;
    };
    left.index_in_parent(u).map(|i| i + 1).unwrap_or(0)
}

/// Emit `MoveNode`s (and physically reorder) for children of `ln`/`rn` whose
/// relative order doesn't already match, per the longest common subsequence
/// of the children already paired across the two sides.
fn align_children(
    left: &mut Tree,
    right: &Tree,
    matching: &mut Matching,
    ln: NodeId,
    rn: NodeId,
) -> Vec<EditOperation> {
    let mut ops = Vec::new();

    let lchildren: Vec<NodeId> = left
        .node(ln)
        .children
        .iter()
        .copied()
        .filter(|&c| matching.right_of(c).is_some_and(|r| right.node(r).parent == Some(rn)))
        .collect();
    let rchildren: Vec<NodeId> = right
        .node(rn)
        .children
        .iter()
        .copied()
        .filter(|&c| matching.left_of(c).is_some_and(|l| left.node(l).parent == Some(ln)))
        .collect();

    if lchildren.is_empty() || rchildren.is_empty() {
        return ops;
    }

    let pairs = longest_common_subsequence(&lchildren, &rchildren, |&a, &b| matching.right_of(a) == Some(b));
    for &(i, j) in &pairs {
        matching.mark_inorder(lchildren[i], rchildren[j]);
    }

    for &unaligned_left in &lchildren {
        if matching.is_inorder_left(unaligned_left) {
            continue;
        }
        let Some(unaligned_right) = matching.right_of(unaligned_left) else {
            continue;
        };
        let pos = find_position(left, right, matching, unaligned_right);
        ops.push(EditOperation::MoveNode {
            node: canonical_xpath(left, unaligned_left),
            target: canonical_xpath(left, ln),
            position: pos,
        });
        left.detach(unaligned_left);
        left.attach_child(ln, unaligned_left, pos);
    }

    ops
}
