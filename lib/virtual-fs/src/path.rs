use std::fmt;
use std::str::FromStr;

use crate::FsError;

/// A normalized, absolute path inside a [`FileSystem`](crate::FileSystem).
///
/// Parsing splits on `/`, drops empty and `.` segments and rejects `..`.
/// The root directory is the path with no segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    pub fn root() -> Self {
        VirtualPath::default()
    }

    pub fn parse(path: &str) -> Result<Self, FsError> {
        let mut segments = Vec::new();

        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(FsError::InvalidInput),
                other => segments.push(other.to_string()),
            }
        }

        Ok(VirtualPath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Split into the parent's segments and the final name.
    pub(crate) fn split_last(&self) -> Option<(&[String], &str)> {
        self.segments
            .split_last()
            .map(|(name, parent)| (parent, name.as_str()))
    }

    pub fn join(&self, name: &str) -> Result<Self, FsError> {
        let mut joined = self.clone();
        joined.segments.extend(VirtualPath::parse(name)?.segments);
        Ok(joined)
    }

    /// Append a segment that is already known to be valid.
    pub(crate) fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        VirtualPath { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        self.split_last().map(|(parent, _)| VirtualPath {
            segments: parent.to_vec(),
        })
    }

    /// Drop the first `count` segments. Returns `None` when nothing is left.
    pub fn strip_components(&self, count: usize) -> Option<Self> {
        if self.segments.len() <= count {
            return None;
        }

        Some(VirtualPath {
            segments: self.segments[count..].to_vec(),
        })
    }
}

impl FromStr for VirtualPath {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VirtualPath::parse(s)
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }

        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }

        Ok(())
    }
}
