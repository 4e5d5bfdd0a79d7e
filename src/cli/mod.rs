//! CLI module for flowstream.
//!
//! - Argument parsing
//! - Version display
//! - Tailing the event stream

pub mod args;
pub mod tail;
pub mod version;

pub use args::{parse_args, CliCommand, TailOptions, USAGE};
pub use tail::run_tail;
pub use version::{version_string, VERSION};
