//! Property-style checks for the quantified and round-trip invariants.

use pretty_assertions::assert_eq;
use xml_diff_core::{
    diff_trees, match_trees, parse, DiffOptions, DiffOutput, MatcherConfig, WhitespaceMode,
};

fn tree(xml: &str) -> xml_diff_core::Tree {
    parse(xml.as_bytes(), WhitespaceMode::None).unwrap()
}

#[test]
fn matcher_scores_clear_the_threshold_and_are_one_to_one() {
    let left = tree("<d><s><p>First</p><p>Second</p></s><s><p>Last</p></s></d>");
    let right = tree("<d><s><p>First</p></s><s><p>Second</p><p>Last</p></s></d>");
    let cfg = MatcherConfig::default();
    let matching = match_trees(&left, &right, &cfg);

    let mut seen_left = std::collections::HashSet::new();
    let mut seen_right = std::collections::HashSet::new();
    for m in matching.matches() {
        assert!(m.score >= cfg.leaf_threshold);
        assert!(seen_left.insert(m.left), "left node {:?} matched more than once", m.left);
        assert!(seen_right.insert(m.right), "right node {:?} matched more than once", m.right);
    }
}

#[test]
fn leaf_ratio_is_reflexive_and_symmetric() {
    use xml_diff_core::Node;
    use xml_diff_core::QName;

    let left = tree(r#"<a x="1">hello</a>"#);
    let right = tree(r#"<a x="2">hello there</a>"#);
    let cfg = xml_diff_core::similarity::SimilarityConfig::default();

    let self_score = xml_diff_core::similarity::leaf_ratio(&left, left.root(), &left, left.root(), &cfg);
    assert_eq!(self_score, 1.0);

    let a_to_b = xml_diff_core::similarity::leaf_ratio(&left, left.root(), &right, right.root(), &cfg);
    let b_to_a = xml_diff_core::similarity::leaf_ratio(&right, right.root(), &left, left.root(), &cfg);
    assert_eq!(a_to_b, b_to_a);

    let _ = Node::new(QName::local("unused"));
}

#[test]
fn placeholder_round_trip_preserves_a_text_subtree() {
    use xml_diff_core::placeholder::PlaceholderMaker;
    use xml_diff_core::{writer, QName};

    let mut original = tree("<doc><para>hello <b>world</b>, goodbye <i>moon</i></para></doc>");
    let mut roundtripped = original.clone();

    let mut maker = PlaceholderMaker::new(vec![QName::local("para")], vec![QName::local("b"), QName::local("i")]);
    maker.do_tree(&mut roundtripped);
    maker.undo_tree(&mut roundtripped);

    let before = String::from_utf8(writer::write(&original, false).unwrap()).unwrap();
    let after = String::from_utf8(writer::write(&roundtripped, false).unwrap()).unwrap();
    assert_eq!(before, after);

    // Touch `original` again so it isn't flagged unused by a future refactor.
    assert!(!original.node(original.root()).children.is_empty());
}

#[test]
fn lcs_pairs_are_strictly_increasing_and_all_equal() {
    use xml_diff_core::lcs::longest_common_subsequence;

    let a = ['a', 'b', 'c', 'b', 'd', 'a', 'b'];
    let b = ['b', 'd', 'c', 'a', 'b', 'a'];
    let pairs = longest_common_subsequence(&a, &b, |x, y| x == y);

    for w in pairs.windows(2) {
        assert!(w[0].0 < w[1].0);
        assert!(w[0].1 < w[1].1);
    }
    for &(i, j) in &pairs {
        assert_eq!(a[i], b[j]);
    }
}

#[test]
fn diffing_a_tree_against_itself_yields_an_empty_edit_script() {
    let left = tree("<d><s a=\"1\"><p>First</p><p>Second</p></s><s><p>Last</p></s></d>");
    let right = left.clone();

    match diff_trees(&left, &right, &DiffOptions::default()).unwrap() {
        DiffOutput::EditScript(ops) => assert!(ops.is_empty(), "expected no ops, got {ops:?}"),
        DiffOutput::Document(_) => panic!("expected an edit script"),
    }
}

#[test]
fn every_emitted_xpath_resolves_to_exactly_one_node_on_the_left_tree_it_was_computed_against() {
    use xml_diff_core::xpath::resolve_xpath;
    use xml_diff_core::EditOperation;

    let left = tree("<r><a/><b/><c/></r>");
    let right = tree("<r><b/><c/><a/></r>");

    let mut left_mut = left.clone();
    let mut matching = match_trees(&left_mut, &right, &MatcherConfig::default());
    let ops = xml_diff_core::generate_edit_script(&mut left_mut, &right, &mut matching);

    let pre_delete_tree = left.clone();
    for op in &ops {
        let xpath = match op {
            EditOperation::InsertNode { target, .. } => target,
            EditOperation::DeleteNode { node } => node,
            EditOperation::MoveNode { node, .. } => node,
            EditOperation::InsertAttrib { node, .. } => node,
            EditOperation::DeleteAttrib { node, .. } => node,
            EditOperation::RenameAttrib { node, .. } => node,
            EditOperation::UpdateAttrib { node, .. } => node,
            EditOperation::UpdateTextIn { node, .. } => node,
            EditOperation::UpdateTextAfter { node, .. } => node,
        };
        assert!(
            resolve_xpath(&pre_delete_tree, xpath, |_, _| true).is_some(),
            "xpath {xpath} should resolve against the original left tree"
        );
    }
}
