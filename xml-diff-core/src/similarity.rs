//! Node-level similarity scoring: leaf ratio and child ratio.

use rustc_hash::FxHashMap;

use crate::node::{Node, NodeId, QName, Tree};
use crate::textsim;

/// The `http://www.w3.org/XML/1998/namespace` URI, home of the standard `xml:id` attribute.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Tunables for node similarity scoring.
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Attribute qnames treated as identity keys; if present on either node
    /// being compared, they fully decide [`leaf_ratio`] (see §4.2 step 2).
    pub unique_attrs: Vec<QName>,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            unique_attrs: vec![QName::with_ns(XML_NAMESPACE, "id", "xml")],
        }
    }
}

/// Similarity of two nodes without considering their children, in `[0, 1]`.
pub fn leaf_ratio(left: &Tree, l: NodeId, right: &Tree, r: NodeId, cfg: &SimilarityConfig) -> f64 {
    let ln = left.node(l);
    let rn = right.node(r);

    if ln.tag != rn.tag {
        return 0.0;
    }

    for attr in &cfg.unique_attrs {
        let lv = ln.attributes.get(attr);
        let rv = rn.attributes.get(attr);
        if lv.is_some() || rv.is_some() {
            return if lv == rv { 1.0 } else { 0.0 };
        }
    }

    textsim::ratio(&node_text(ln), &node_text(rn))
}

/// The "node text" used for non-unique-attr leaf comparison: sorted
/// `name:value` attribute strings, then stripped leading text, then
/// stripped tail text, joined with single spaces.
fn node_text(n: &Node) -> String {
    let mut parts: Vec<String> = n
        .attributes
        .iter()
        .map(|(k, v)| format!("{}:{v}", k.display()))
        .collect();
    parts.sort();

    if let Some(t) = n.text.as_deref() {
        let t = t.trim();
        if !t.is_empty() {
            parts.push(t.to_string());
        }
    }
    if let Some(t) = n.tail.as_deref() {
        let t = t.trim();
        if !t.is_empty() {
            parts.push(t.to_string());
        }
    }

    parts.join(" ")
}

/// Fraction of `l`'s children already matched (per `left_to_right`) to a
/// child of `r`, in `[0, 1]`. Returns `1.0` for two childless nodes.
pub fn child_ratio(
    left: &Tree,
    l: NodeId,
    right: &Tree,
    r: NodeId,
    left_to_right: &FxHashMap<NodeId, NodeId>,
) -> f64 {
    let lchildren = &left.node(l).children;
    let rchildren = &right.node(r).children;

    if lchildren.is_empty() && rchildren.is_empty() {
        return 1.0;
    }

    let total = lchildren.len().max(rchildren.len());
    if total == 0 {
        return 1.0;
    }

    let matched = lchildren
        .iter()
        .filter(|c| {
            left_to_right
                .get(c)
                .is_some_and(|mapped| rchildren.contains(mapped))
        })
        .count();

    matched as f64 / total as f64
}
