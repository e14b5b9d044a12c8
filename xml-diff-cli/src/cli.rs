use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "xml-diff")]
#[command(about = "Compare two XML documents and show semantic differences")]
pub struct Cli {
    /// The original document.
    pub left: PathBuf,
    /// The changed document.
    pub right: PathBuf,
    /// How to render the result.
    #[arg(long, value_enum, default_value_t = Formatter::Diff)]
    pub formatter: Formatter,
    /// Preserve whitespace-only text nodes between tags instead of dropping them.
    #[arg(long)]
    pub keep_whitespace: bool,
    /// Pretty-print XML output (ignored by the `diff` formatter).
    #[arg(long)]
    pub pretty_print: bool,
    /// Edit-script rendering, only meaningful with `--formatter diff`.
    #[arg(long, value_enum, default_value_t = EditScriptFormat::Text)]
    pub format: EditScriptFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Formatter {
    /// Render the bare edit script.
    Diff,
    /// Annotate a copy of the left document with `diff:*` markup.
    Xml,
    /// Like `xml`, but track inline prose/markup formatting changes at the
    /// character level instead of whole-element replacement.
    Rml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EditScriptFormat {
    /// One `[verb, arg, ...]` JSON array per line.
    Text,
    /// A single pretty-printed JSON array of tagged operation objects.
    Json,
}
