//! Output formatting for CLI.

mod json;
mod text;

pub use json::{CheckOutput, ClearCacheOutput, JsonFormatter, PathsOutput};
pub use text::TextFormatter;
