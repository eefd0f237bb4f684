//! The `playground` command-line tool.
//!
//! Splits multi-file Ruby sources, installs interpreter distributions into a
//! virtual filesystem and runs the result inside a WASI sandbox.

#![deny(
    missing_docs,
    dead_code,
    nonstandard_style,
    unused_mut,
    unused_variables,
    unused_unsafe,
    unreachable_patterns
)]

mod cli;
pub mod commands;
pub mod logging;

pub use crate::cli::{playground_main, PlaygroundCmd};

/// Version number of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
