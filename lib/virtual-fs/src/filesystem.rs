//! This module contains the [`FileSystem`] type itself.

use std::collections::btree_map::Entry;
use std::sync::Arc;

use bytes::Bytes;

use crate::{DirEntry, Directory, FileType, FsError, Node, Result, VirtualPath, Walk};

/// The in-memory file system!
///
/// Cloning is a reference-count bump on the root. Every mutation copies the
/// directories it passes through when they are shared with another clone
/// (see [`Arc::make_mut()`]), so a clone behaves like a deep copy without
/// paying for one up front.
#[derive(Debug, Clone, Default)]
pub struct FileSystem {
    root: Arc<Directory>,
}

impl FileSystem {
    pub fn new() -> Self {
        FileSystem::default()
    }

    pub fn root(&self) -> &Directory {
        &self.root
    }

    /// Returns `true` if both filesystems currently share the same root.
    pub fn shares_root_with(&self, other: &FileSystem) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// Create a directory.
    ///
    /// Missing intermediate directories are only created when `recursive` is
    /// set, otherwise [`FsError::EntityNotFound`] is returned. Creating a
    /// directory that already exists succeeds.
    pub fn mkdir(&mut self, path: &str, recursive: bool) -> Result<()> {
        let path = VirtualPath::parse(path)?;
        self.mkdir_at(&path, recursive)
    }

    pub fn mkdir_at(&mut self, path: &VirtualPath, recursive: bool) -> Result<()> {
        let Some((parent, name)) = path.split_last() else {
            // The root always exists.
            return Ok(());
        };

        let parent = self.directory_mut(parent, recursive)?;

        match parent.children.entry(name.to_string()) {
            Entry::Occupied(entry) => match entry.get() {
                Node::Directory(_) => Ok(()),
                Node::File(_) => Err(FsError::AlreadyExists),
            },
            Entry::Vacant(entry) => {
                tracing::trace!(%path, "Creating directory");
                entry.insert(Node::Directory(Arc::default()));
                Ok(())
            }
        }
    }

    /// Create or overwrite a file, creating any missing parent directories.
    pub fn write_file(&mut self, path: &str, contents: impl Into<Bytes>) -> Result<()> {
        let path = VirtualPath::parse(path)?;
        self.insert_file(&path, contents.into(), true)
    }

    pub fn write_file_at(&mut self, path: &VirtualPath, contents: impl Into<Bytes>) -> Result<()> {
        self.insert_file(path, contents.into(), true)
    }

    /// Create or overwrite a file whose parent directory must already exist.
    pub fn create_file(&mut self, path: &str, contents: impl Into<Bytes>) -> Result<()> {
        let path = VirtualPath::parse(path)?;
        self.insert_file(&path, contents.into(), false)
    }

    fn insert_file(
        &mut self,
        path: &VirtualPath,
        contents: Bytes,
        create_parents: bool,
    ) -> Result<()> {
        let Some((parent, name)) = path.split_last() else {
            return Err(FsError::AlreadyExists);
        };

        let parent = self.directory_mut(parent, create_parents)?;

        match parent.children.entry(name.to_string()) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Node::File(existing) => {
                    *existing = contents;
                    Ok(())
                }
                Node::Directory(_) => Err(FsError::AlreadyExists),
            },
            Entry::Vacant(entry) => {
                tracing::trace!(%path, len = contents.len(), "Creating file");
                entry.insert(Node::File(contents));
                Ok(())
            }
        }
    }

    pub fn read_file(&self, path: &str) -> Result<Bytes> {
        let path = VirtualPath::parse(path)?;
        self.read_file_at(&path)
    }

    pub fn read_file_at(&self, path: &VirtualPath) -> Result<Bytes> {
        let Some((parent, name)) = path.split_last() else {
            return Err(FsError::NotAFile);
        };

        match self.directory(parent)?.children.get(name) {
            Some(Node::File(contents)) => Ok(contents.clone()),
            Some(Node::Directory(_)) => Err(FsError::NotAFile),
            None => Err(FsError::EntityNotFound),
        }
    }

    pub fn metadata(&self, path: &str) -> Result<FileType> {
        let path = VirtualPath::parse(path)?;
        let Some((parent, name)) = path.split_last() else {
            return Ok(FileType::Directory);
        };

        self.directory(parent)?
            .children
            .get(name)
            .map(Node::file_type)
            .ok_or(FsError::EntityNotFound)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.metadata(path).is_ok()
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.metadata(path).is_ok_and(FileType::is_dir)
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.metadata(path).is_ok_and(FileType::is_file)
    }

    /// List a directory's immediate children, ordered by name.
    pub fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let path = VirtualPath::parse(path)?;
        let dir = self.directory(path.segments())?;

        Ok(dir
            .iter()
            .map(|(name, node)| DirEntry {
                name: name.to_string(),
                file_type: node.file_type(),
                len: node.len(),
            })
            .collect())
    }

    /// Visit every entry depth-first, parents before children.
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(&self.root)
    }

    fn directory(&self, segments: &[String]) -> Result<&Directory> {
        let mut current: &Directory = &self.root;

        for segment in segments {
            current = match current.children.get(segment) {
                Some(Node::Directory(dir)) => dir,
                Some(Node::File(_)) => return Err(FsError::NotADirectory),
                None => return Err(FsError::EntityNotFound),
            };
        }

        Ok(current)
    }

    /// Resolve a directory for writing, un-sharing every directory on the way.
    fn directory_mut(&mut self, segments: &[String], create: bool) -> Result<&mut Directory> {
        let mut current: &mut Directory = Arc::make_mut(&mut self.root);

        for segment in segments {
            let child = match current.children.entry(segment.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) if create => entry.insert(Node::Directory(Arc::default())),
                Entry::Vacant(_) => return Err(FsError::EntityNotFound),
            };

            current = match child {
                Node::Directory(dir) => Arc::make_mut(dir),
                Node::File(_) => return Err(FsError::NotADirectory),
            };
        }

        Ok(current)
    }
}
