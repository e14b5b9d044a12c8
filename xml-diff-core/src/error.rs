//! Domain errors raised by the annotating formatter.

use thiserror::Error;

/// Errors raised while applying an edit script to produce an annotated tree.
///
/// Parsing and writing XML have their own error types ([`crate::parser::ParseError`],
/// [`crate::writer::WriteError`]); matching and edit-script generation are
/// infallible given two already-parsed trees.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A formatter's XPath lookup resolved to zero or more than one node.
    #[error("xpath {xpath} resolved to {found} node(s), expected exactly 1")]
    XPathAmbiguous {
        /// The xpath expression that was looked up.
        xpath: String,
        /// How many nodes it actually matched.
        found: usize,
    },
}
