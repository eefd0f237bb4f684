use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;

/// An entry in the tree.
///
/// Both variants are cheap to clone: file contents are a [`Bytes`] and
/// directories are reference counted.
#[derive(Debug, Clone)]
pub enum Node {
    File(Bytes),
    Directory(Arc<Directory>),
}

impl Node {
    pub fn file_type(&self) -> FileType {
        match self {
            Node::File(_) => FileType::File,
            Node::Directory(_) => FileType::Directory,
        }
    }

    /// Content length for files, number of children for directories.
    pub fn len(&self) -> u64 {
        match self {
            Node::File(contents) => contents.len() as u64,
            Node::Directory(dir) => dir.children.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub(crate) children: BTreeMap<String, Node>,
}

impl Directory {
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

impl FileType {
    pub fn is_dir(self) -> bool {
        self == FileType::Directory
    }

    pub fn is_file(self) -> bool {
        self == FileType::File
    }
}

/// One item returned by [`FileSystem::read_dir()`](crate::FileSystem::read_dir).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub file_type: FileType,
    pub len: u64,
}
