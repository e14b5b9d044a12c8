//! The node matcher: builds a best-effort correspondence between nodes of a
//! left tree and a right tree.

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::node::{NodeId, Tree};
use crate::similarity::{self, SimilarityConfig};
use crate::xpath::canonical_xpath;

/// A single node correspondence, with the score that produced it.
#[derive(Debug, Clone, Copy)]
pub struct Match {
    pub left: NodeId,
    pub right: NodeId,
    pub score: f64,
}

/// The result of matching: every recorded [`Match`], plus both directions of
/// the left<->right index the edit-script generator walks repeatedly.
#[derive(Debug, Default)]
pub struct Matching {
    matches: Vec<Match>,
    left_to_right: FxHashMap<NodeId, NodeId>,
    right_to_left: FxHashMap<NodeId, NodeId>,
    /// Nodes (on either side) considered already in relative order by the
    /// edit-script generator's alignment pass. Kept per-side since left and
    /// right `NodeId`s are drawn from independent arenas and may collide
    /// numerically.
    inorder_left: FxHashSet<NodeId>,
    inorder_right: FxHashSet<NodeId>,
}

impl Matching {
    /// Record a correspondence, e.g. for a freshly materialized inserted node.
    pub fn add_match(&mut self, left: NodeId, right: NodeId, score: f64) {
        self.record(left, right, score);
    }

    fn record(&mut self, left: NodeId, right: NodeId, score: f64) {
        self.matches.push(Match { left, right, score });
        self.left_to_right.insert(left, right);
        self.right_to_left.insert(right, left);
    }

    /// The right-tree partner of a left node, if matched.
    pub fn right_of(&self, left: NodeId) -> Option<NodeId> {
        self.left_to_right.get(&left).copied()
    }

    /// The left-tree partner of a right node, if matched.
    pub fn left_of(&self, right: NodeId) -> Option<NodeId> {
        self.right_to_left.get(&right).copied()
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn left_to_right(&self) -> &FxHashMap<NodeId, NodeId> {
        &self.left_to_right
    }

    pub fn mark_inorder(&mut self, left: NodeId, right: NodeId) {
        self.inorder_left.insert(left);
        self.inorder_right.insert(right);
    }

    pub fn is_inorder_left(&self, id: NodeId) -> bool {
        self.inorder_left.contains(&id)
    }

    pub fn is_inorder_right(&self, id: NodeId) -> bool {
        self.inorder_right.contains(&id)
    }
}

/// Tunables controlling how aggressively the matcher and edit-script
/// generator consider two nodes "the same". `tree_threshold` is accepted for
/// parity with the reference API and reserved for future tree-level pruning;
/// it does not currently affect matching.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub leaf_threshold: f64,
    pub tree_threshold: f64,
    pub similarity: SimilarityConfig,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            leaf_threshold: 0.5,
            tree_threshold: 0.5,
            similarity: SimilarityConfig::default(),
        }
    }
}

/// Match every node of `left` against a node of `right`.
///
/// Walks `left` in post order; for each left node, scans the remaining
/// unmatched right nodes for the highest `leaf_ratio * child_ratio` score,
/// breaking ties in favor of a right node sharing the left node's canonical
/// XPath, and short-circuiting the inner scan on a perfect, same-path match.
/// A candidate is recorded only if its score clears `cfg.leaf_threshold`;
/// once a right node is matched it is removed from further consideration.
pub fn match_trees(left: &Tree, right: &Tree, cfg: &MatcherConfig) -> Matching {
    let mut matching = Matching::default();

    let left_order = left.post_order(left.root());
    let mut remaining_right: Vec<NodeId> = right.post_order(right.root());

    for lnode in left_order {
        let mut best_score = 0.0f64;
        let mut best: Option<NodeId> = None;

        for &rnode in remaining_right.iter() {
            let score = similarity::leaf_ratio(left, lnode, right, rnode, &cfg.similarity)
                * similarity::child_ratio(left, lnode, right, rnode, matching.left_to_right());

            if score > best_score {
                best_score = score;
                best = Some(rnode);
            } else if (score - best_score).abs() < f64::EPSILON
                && score >= cfg.leaf_threshold
                && canonical_xpath(left, lnode) == canonical_xpath(right, rnode)
            {
                best = Some(rnode);
            }

            if (score - 1.0).abs() < f64::EPSILON
                && canonical_xpath(left, lnode) == canonical_xpath(right, rnode)
            {
                best_score = score;
                best = Some(rnode);
                break;
            }
        }

        if best_score >= cfg.leaf_threshold {
            if let Some(rnode) = best {
                trace!("matched left node {lnode} to right node {rnode} (score {best_score:.3})");
                matching.record(lnode, rnode, best_score);
                remaining_right.retain(|&r| r != rnode);
            }
        }
    }

    debug!("matched {} of {} left node(s)", matching.matches().len(), left.arena_len());
    matching
}
