//! CLI-specific output implementations
//!
//! Concrete implementations of the reply output abstraction for the terminal.

pub mod cli_handler;
pub mod formatters;

pub use cli_handler::{typewrite, CliOutputConfig, CliOutputHandler, InspireOutput, NotesOutput};
