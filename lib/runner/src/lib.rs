//! Runs a multi-file program through a sandboxed WASI interpreter.
//!
//! The usual flow is:
//!
//! 1. [`Harness::prepare`] installs a distribution archive into a fresh
//!    [`playground_vfs::FileSystem`] and compiles the interpreter it ships.
//! 2. [`ExecutionRequest::from_source`] splits an editor buffer on
//!    `#--- <name>` markers (see [`split()`]).
//! 3. [`Harness::run`] copies the filesystem, writes the request's files into
//!    the copy and runs the interpreter against it, streaming output as it is
//!    produced.
//!
//! [`Worker`] wraps the same flow in a dedicated thread that is driven with
//! messages.

mod action;
mod config;
mod error;
mod harness;
mod output;
mod request;
mod sandbox;
pub mod split;
mod worker;

pub use crate::{
    action::Action,
    config::{ArchiveConfig, ConfigError, HarnessConfig, InterpreterConfig},
    error::HarnessError,
    harness::Harness,
    output::{RunOutcome, Utf8Decoder},
    request::ExecutionRequest,
    split::{split, SourceFile, SplitSource},
    worker::{RunEvent, RunEvents, Worker},
};
