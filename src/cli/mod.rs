//! CLI module - argument parsing and interactive prompts

mod args;
mod prompts;

pub use args::{ClassifierKind, Cli};
pub use prompts::*;
