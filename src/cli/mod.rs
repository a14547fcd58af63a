//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, keyboard and Ctrl+C
//! handling, and the recorder loop.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, RunOptions};
pub use presenter::Presenter;
