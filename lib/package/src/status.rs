use std::fmt;
use std::sync::Arc;

/// Coarse phase changes reported while preparing a sandbox.
///
/// These are advisory and meant to be shown to a user as-is, so the
/// [`Display`](fmt::Display) implementation is the interesting part.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Status {
    /// The archive is being acquired.
    Fetching,
    /// Part of the archive has arrived.
    Downloading { received: u64, total: Option<u64> },
    /// The nested tarball is being located and decompressed.
    Unpacking,
    /// Archive entries are being written to the filesystem.
    Installing,
    /// All entries have been written.
    Installed { files: usize },
    /// The interpreter module is being compiled.
    Loading,
    /// The harness can accept runs.
    Ready,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Fetching => f.write_str("Fetching…"),
            Status::Downloading {
                received,
                total: Some(total),
            } if *total > 0 => {
                let percent = received.saturating_mul(100) / total;
                write!(f, "Downloading… {}%", percent.min(100))
            }
            Status::Downloading { received, .. } => write!(f, "Downloading… {received} bytes"),
            Status::Unpacking => f.write_str("Unpacking…"),
            Status::Installing => f.write_str("Installing…"),
            Status::Installed { files } => write!(f, "Installed {files} files"),
            Status::Loading => f.write_str("Loading…"),
            Status::Ready => f.write_str("Ready"),
        }
    }
}

/// Receives [`Status`] updates.
///
/// Cloning is cheap, all clones call the same callback.
#[derive(Clone)]
pub struct StatusReporter {
    callback: Arc<dyn Fn(Status) + Send + Sync>,
}

impl StatusReporter {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Status) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// A reporter that drops every update.
    pub fn silent() -> Self {
        StatusReporter::new(|_| {})
    }

    pub fn notify(&self, status: Status) {
        tracing::debug!(%status, "Status changed");
        (self.callback)(status)
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        StatusReporter::silent()
    }
}

impl fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter").finish()
    }
}
