//! Edit-script output formatters.

pub mod annotate;
pub mod json;
pub mod text;

pub use annotate::{AnnotatingFormatter, FormatterOptions};
pub use json::format_json;
pub use text::format_wire;
