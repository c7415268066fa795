//! Command output: a JSON envelope for scripts, plain text for people.

mod format;
mod model;

pub use format::OutputFormat;
pub use model::{CommandResult, emit};
