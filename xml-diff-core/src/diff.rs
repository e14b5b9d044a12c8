//! Top-level entry points: parse (or accept) a pair of trees, run the full
//! matcher / edit-script / formatter pipeline, and return whichever shape
//! the caller asked for.

use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::edit::{generate_edit_script, EditOperation};
use crate::error::DiffError;
use crate::format::annotate::{AnnotatingFormatter, FormatterOptions};
use crate::matcher::{match_trees, MatcherConfig};
use crate::node::{QName, Tree};
use crate::parser::{self, ParseError, WhitespaceMode};
use crate::similarity::{SimilarityConfig, XML_NAMESPACE};

/// Which formatter (if any) to run the edit script through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterChoice {
    /// No tree annotation: callers get the bare edit script, to render
    /// themselves (see [`crate::format::text`]/[`crate::format::json`]).
    Diff,
    /// Annotate a clone of the left tree with `diff:*` markup, with no
    /// inline-text placeholder substitution.
    Xml,
    /// Like `Xml`, but first collapses a preset of prose/markup tags
    /// (`para`, `h1`-`h6`, inline `b`/`i`/`u`/... tags) into placeholders so
    /// formatting changes inside running text are tracked at the character
    /// level instead of whole-element replacement.
    Rml,
}

/// Tunables for the matcher, edit-script generator, and (if selected) the
/// annotating formatter.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Minimum leaf similarity ratio for two nodes to be considered a match (`F`).
    pub f_threshold: f64,
    /// Reserved for a future subtree-similarity cutoff (`T`); currently unused,
    /// exactly as in the reference algorithm this is modeled on.
    pub t_threshold: f64,
    /// Attributes whose value alone, if shared by two same-tag nodes,
    /// forces a match regardless of similarity score.
    pub unique_attrs: Vec<QName>,
    /// Formatter to run the edit script through, if any.
    pub formatter: Option<FormatterChoice>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            f_threshold: 0.5,
            t_threshold: 0.5,
            unique_attrs: vec![QName::with_ns(XML_NAMESPACE, "id", "xml")],
            formatter: None,
        }
    }
}

/// The result of a diff: either the bare edit script, or a tree already
/// carrying `diff:*` annotation markup, depending on [`DiffOptions::formatter`].
#[derive(Debug, Clone)]
pub enum DiffOutput {
    EditScript(Vec<EditOperation>),
    Document(Tree),
}

/// Errors from the combined parse-then-diff entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Diff(#[from] DiffError),
}

fn xml_formatter_options() -> FormatterOptions {
    FormatterOptions {
        normalize: WhitespaceMode::None,
        pretty_print: true,
        text_tags: Vec::new(),
        formatting_tags: Vec::new(),
    }
}

fn rml_formatter_options() -> FormatterOptions {
    FormatterOptions {
        normalize: WhitespaceMode::Both,
        pretty_print: true,
        text_tags: ["para", "h1", "h2", "h3", "h4", "h5", "h6"]
            .iter()
            .map(|t| QName::local(*t))
            .collect(),
        formatting_tags: ["b", "u", "i", "strike", "em", "super", "sup", "sub", "link", "a", "span"]
            .iter()
            .map(|t| QName::local(*t))
            .collect(),
    }
}

/// Run the full pipeline on a pair of already-parsed trees. Neither input
/// tree is mutated; both are cloned internally since the edit-script
/// generator consumes its working copy as it emits.
pub fn diff_trees(left: &Tree, right: &Tree, options: &DiffOptions) -> Result<DiffOutput, DiffError> {
    let mut left = left.clone();
    let mut right = right.clone();

    let mut formatter = match options.formatter {
        Some(FormatterChoice::Xml) => Some(AnnotatingFormatter::new(xml_formatter_options())),
        Some(FormatterChoice::Rml) => Some(AnnotatingFormatter::new(rml_formatter_options())),
        Some(FormatterChoice::Diff) | None => None,
    };
    if let Some(formatter) = formatter.as_mut() {
        formatter.prepare(&mut left, &mut right);
    }

    let orig_left = left.clone();
    let matcher_cfg = MatcherConfig {
        leaf_threshold: options.f_threshold,
        tree_threshold: options.t_threshold,
        similarity: SimilarityConfig { unique_attrs: options.unique_attrs.clone() },
    };

    debug!("matching {} left node(s) against {} right node(s)", left.arena_len(), right.arena_len());
    let mut matching = match_trees(&left, &right, &matcher_cfg);
    let ops = generate_edit_script(&mut left, &right, &mut matching);
    debug!("generated {} edit operation(s)", ops.len());

    match formatter {
        Some(mut formatter) => Ok(DiffOutput::Document(formatter.format(&ops, &orig_left)?)),
        None => Ok(DiffOutput::EditScript(ops)),
    }
}

/// Parse `left_xml`/`right_xml` and diff them.
pub fn diff_texts(
    left_xml: &[u8],
    right_xml: &[u8],
    ws: WhitespaceMode,
    options: &DiffOptions,
) -> Result<DiffOutput, Error> {
    let left = parser::parse(left_xml, ws)?;
    let right = parser::parse(right_xml, ws)?;
    Ok(diff_trees(&left, &right, options)?)
}

/// Parse the files at `left_path`/`right_path` and diff them.
pub fn diff_files(
    left_path: &Path,
    right_path: &Path,
    ws: WhitespaceMode,
    options: &DiffOptions,
) -> Result<DiffOutput, Error> {
    let left = parser::parse_file(left_path, ws)?;
    let right = parser::parse_file(right_path, ws)?;
    Ok(diff_trees(&left, &right, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn diff_trees_without_formatter_returns_edit_script() {
        let left = Tree::new(Node::new(QName::local("r")));
        let mut right = Tree::new(Node::new(QName::local("r")));
        let rn = right.alloc(Node::new(QName::local("a")));
        right.append_child(right.root(), rn);

        let out = diff_trees(&left, &right, &DiffOptions::default()).unwrap();
        match out {
            DiffOutput::EditScript(ops) => assert_eq!(ops.len(), 1),
            DiffOutput::Document(_) => panic!("expected an edit script, got a document"),
        }
    }

    #[test]
    fn diff_trees_with_xml_formatter_returns_annotated_document() {
        let left = Tree::new(Node::new(QName::local("r")));
        let mut right = Tree::new(Node::new(QName::local("r")));
        let rn = right.alloc(Node::new(QName::local("a")));
        right.append_child(right.root(), rn);

        let options = DiffOptions { formatter: Some(FormatterChoice::Xml), ..DiffOptions::default() };
        let out = diff_trees(&left, &right, &options).unwrap();
        match out {
            DiffOutput::Document(tree) => assert_eq!(tree.node(tree.root()).children.len(), 1),
            DiffOutput::EditScript(_) => panic!("expected a document, got an edit script"),
        }
    }

    #[test]
    fn identical_trees_produce_empty_edit_script() {
        let left = Tree::new(Node::new(QName::local("r")));
        let right = Tree::new(Node::new(QName::local("r")));
        let out = diff_trees(&left, &right, &DiffOptions::default()).unwrap();
        match out {
            DiffOutput::EditScript(ops) => assert!(ops.is_empty()),
            DiffOutput::Document(_) => panic!("expected an edit script, got a document"),
        }
    }
}
