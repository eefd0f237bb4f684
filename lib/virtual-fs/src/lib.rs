//! A persistent, in-memory directory tree.
//!
//! The [`FileSystem`] in this crate is the sandbox's entire view of storage.
//! Directories are reference counted and copied lazily, so cloning a
//! filesystem is O(1) and a write into the clone only copies the directories
//! on the path from the root to the entry being written. Clones never observe
//! each other's writes, no matter how deep in the tree they happen.

mod filesystem;
mod node;
mod path;
mod walk;

pub use filesystem::FileSystem;
pub use node::{DirEntry, Directory, FileType, Node};
pub use path::VirtualPath;
pub use walk::Walk;

use thiserror::Error;

pub type Result<T, E = FsError> = std::result::Result<T, E>;

/// Errors raised by [`FileSystem`] operations.
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum FsError {
    /// The requested file or directory could not be found
    #[error("entity not found")]
    EntityNotFound,
    /// A path segment that had to be a directory is a file
    #[error("not a directory")]
    NotADirectory,
    /// An entry of the other kind already occupies the path
    #[error("file exists")]
    AlreadyExists,
    /// Expected a file but found a directory
    #[error("not a file")]
    NotAFile,
    /// The path could not be interpreted (e.g. it contains `..`)
    #[error("invalid input")]
    InvalidInput,
}
