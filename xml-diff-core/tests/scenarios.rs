//! Integration tests for the six named diff scenarios: each pins a minimal
//! left/right document pair (read from `tests/fixtures/`) to an exact,
//! human-predictable edit script.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rstest::rstest;

use xml_diff_core::diff::FormatterChoice;
use xml_diff_core::{diff_trees, parse_file, writer, DiffOptions, DiffOutput, EditOperation, QName, WhitespaceMode};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn script(left_fixture: &str, right_fixture: &str) -> Vec<EditOperation> {
    let left = parse_file(&fixture(left_fixture), WhitespaceMode::None).expect("left parse");
    let right = parse_file(&fixture(right_fixture), WhitespaceMode::None).expect("right parse");
    match diff_trees(&left, &right, &DiffOptions::default()).expect("diff") {
        DiffOutput::EditScript(ops) => ops,
        DiffOutput::Document(_) => panic!("expected an edit script, not an annotated document"),
    }
}

#[rstest]
#[case::attribute_update_only(
    "scenario1_left.xml",
    "scenario1_right.xml",
    EditOperation::UpdateAttrib { node: "/r/n[1]".to_string(), name: QName::local("a"), value: "w".to_string() },
)]
#[case::attribute_rename(
    "scenario5_left.xml",
    "scenario5_right.xml",
    EditOperation::RenameAttrib {
        node: "/r/n[1]".to_string(),
        old_name: QName::local("attr1"),
        new_name: QName::local("attr4"),
    },
)]
fn scenario_has_exactly_one_matching_op(
    #[case] left_fixture: &str,
    #[case] right_fixture: &str,
    #[case] expected: EditOperation,
) {
    let ops = script(left_fixture, right_fixture);
    assert_eq!(ops.len(), 1, "expected exactly one op, got {ops:?}");
    assert_eq!(ops[0], expected);
}

#[rstest]
#[case::sibling_reorder("scenario2_left.xml", "scenario2_right.xml")]
fn scenario_2_sibling_reorder(#[case] left_fixture: &str, #[case] right_fixture: &str) {
    let ops = script(left_fixture, right_fixture);

    let moves: Vec<_> = ops.iter().filter(|op| matches!(op, EditOperation::MoveNode { .. })).collect();
    assert_eq!(moves.len(), 1, "expected exactly one move, got {ops:?}");
    assert_eq!(
        *moves[0],
        EditOperation::MoveNode { node: "/r/a[1]".to_string(), target: "/r".to_string(), position: 2 }
    );

    assert!(!ops.iter().any(|op| matches!(op, EditOperation::InsertNode { .. })));
    assert!(!ops.iter().any(|op| matches!(op, EditOperation::DeleteNode { .. })));
}

#[rstest]
#[case::paragraph_split("scenario3_left.xml", "scenario3_right.xml")]
fn scenario_3_paragraph_split(#[case] left_fixture: &str, #[case] right_fixture: &str) {
    let ops = script(left_fixture, right_fixture);

    let moves: Vec<_> = ops
        .iter()
        .filter_map(|op| match op {
            EditOperation::MoveNode { node, target, position } => Some((node, target, *position)),
            _ => None,
        })
        .collect();
    assert!(
        moves.iter().any(|(node, target, position)| {
            node.as_str() == "/d/s[1]/p[2]" && target.as_str() == "/d/s[2]" && *position == 0
        }),
        "expected a move of the second paragraph into the second section at position 0, got {moves:?}"
    );
}

#[rstest]
#[case::unique_id_dominance("scenario4_left.xml", "scenario4_right.xml")]
fn scenario_4_unique_id_dominance(#[case] left_fixture: &str, #[case] right_fixture: &str) {
    let ops = script(left_fixture, right_fixture);

    assert!(ops.iter().any(|op| matches!(
        op,
        EditOperation::UpdateTextIn { node, text }
            if node == "/root/section[1]/body[1]" && text.as_deref() == Some("Y")
    )));

    assert!(!ops.iter().any(|op| matches!(
        op,
        EditOperation::MoveNode { node, .. } if node == "/root/section[1]"
    )));
}

#[rstest]
#[case::inline_formatting_diff_via_placeholders("scenario6_left.xml", "scenario6_right.xml")]
fn scenario_6_inline_formatting_diff_via_placeholders(#[case] left_fixture: &str, #[case] right_fixture: &str) {
    let left = parse_file(&fixture(left_fixture), WhitespaceMode::None).expect("left parse");
    let right = parse_file(&fixture(right_fixture), WhitespaceMode::None).expect("right parse");

    let options = DiffOptions {
        formatter: Some(FormatterChoice::Rml),
        ..DiffOptions::default()
    };
    let tree = match diff_trees(&left, &right, &options).expect("diff") {
        DiffOutput::Document(tree) => tree,
        DiffOutput::EditScript(_) => panic!("expected an annotated document"),
    };

    let rendered = String::from_utf8(writer::write(&tree, false).expect("serialize")).expect("utf8");
    assert!(rendered.contains("<b>"), "expected the original <b> element to survive: {rendered}");
    assert_eq!(
        rendered.matches("<b").count(),
        1,
        "expected no extra <b> element to be emitted: {rendered}"
    );
    assert!(
        rendered.contains("diff:delete") && rendered.contains("world"),
        "expected a diff:delete wrapper around the removed word: {rendered}"
    );
    assert!(
        rendered.contains("diff:insert") && rendered.contains("brave"),
        "expected a diff:insert wrapper around the added word: {rendered}"
    );
}
