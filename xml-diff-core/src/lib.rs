//! Semantic XML tree diffing: match nodes between two trees, generate a
//! minimal edit script between them, and optionally render that script as
//! `diff:*`-annotated XML.
//!
//! The pipeline is: [`parser::parse`] both documents, run [`matcher::match_trees`]
//! to build a correspondence, feed that into [`edit::generate_edit_script`] to
//! get an ordered [`edit::EditOperation`] list, and either hand that list to a
//! caller directly or pass it to [`format::annotate::AnnotatingFormatter`] for
//! inline markup. [`diff::diff_trees`]/[`diff::diff_texts`]/[`diff::diff_files`]
//! wire all of this together for the common cases.

pub mod diff;
pub mod edit;
pub mod error;
pub mod format;
pub mod lcs;
pub mod matcher;
pub mod node;
pub mod parser;
pub mod placeholder;
pub mod similarity;
pub mod textdiff;
pub mod textsim;
pub mod writer;
pub mod xpath;

pub use diff::{diff_files, diff_texts, diff_trees, DiffOptions, DiffOutput, FormatterChoice};
pub use edit::{generate_edit_script, EditOperation};
pub use error::DiffError;
pub use matcher::{match_trees, Match, MatcherConfig, Matching};
pub use node::{DetachedNode, Node, NodeId, QName, Tree};
pub use parser::{parse, parse_file, ParseError, WhitespaceMode};
pub use writer::{write, write_file, WriteError};
