use anyhow::{Context, Result};
use clap::Parser;
use xml_diff_core::diff::{diff_files, DiffOptions, DiffOutput, FormatterChoice};
use xml_diff_core::format::{format_json, format_wire};
use xml_diff_core::parser::WhitespaceMode;
use xml_diff_core::writer;

mod cli;

use cli::{Cli, EditScriptFormat, Formatter};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let ws = if cli.keep_whitespace { WhitespaceMode::None } else { WhitespaceMode::Tags };
    let formatter = match cli.formatter {
        Formatter::Diff => FormatterChoice::Diff,
        Formatter::Xml => FormatterChoice::Xml,
        Formatter::Rml => FormatterChoice::Rml,
    };
    let options = DiffOptions { formatter: Some(formatter), ..DiffOptions::default() };

    let output = diff_files(&cli.left, &cli.right, ws, &options)
        .with_context(|| format!("failed to diff {} against {}", cli.left.display(), cli.right.display()))?;

    match output {
        DiffOutput::EditScript(ops) => {
            let rendered = match cli.format {
                EditScriptFormat::Text => format_wire(&ops),
                EditScriptFormat::Json => format_json(&ops).context("failed to render edit script as JSON")?,
            };
            println!("{rendered}");
        }
        DiffOutput::Document(tree) => {
            let bytes = writer::write(&tree, cli.pretty_print).context("failed to serialize annotated document")?;
            println!("{}", String::from_utf8_lossy(&bytes));
        }
    }

    Ok(())
}
