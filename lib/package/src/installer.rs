use std::io::{BufRead, BufReader, Read, Seek};

use bytes::Bytes;
use flate2::bufread::GzDecoder;
use playground_vfs::{FileSystem, FsError, VirtualPath};
use tar::Archive;
use zip::{result::ZipError, ZipArchive};

use crate::{Status, StatusReporter};

/// Errors that may occur while installing an archive.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InstallError {
    /// The outer archive doesn't contain the nested tarball.
    #[error("The archive doesn't contain \"{name}\"")]
    MissingExpectedEntry { name: String },
    /// The tarball contains something other than files and directories.
    #[error("Unsupported {kind} entry at \"{path}\"")]
    UnsupportedEntryKind { path: String, kind: String },
    /// Unable to read the outer archive.
    #[error("Unable to read the archive")]
    Archive(#[from] ZipError),
    /// Unable to decompress or parse the tarball.
    #[error("Unable to extract the tarball")]
    Tarball(#[source] std::io::Error),
    /// The target filesystem rejected an entry.
    #[error("Unable to install \"{path}\"")]
    Filesystem {
        path: String,
        #[source]
        source: FsError,
    },
}

/// The two operations an installer needs from a filesystem.
pub trait InstallTarget {
    fn mkdir(&mut self, path: &VirtualPath, recursive: bool) -> Result<(), FsError>;
    fn write_file(&mut self, path: &VirtualPath, contents: Bytes) -> Result<(), FsError>;
}

impl InstallTarget for FileSystem {
    fn mkdir(&mut self, path: &VirtualPath, recursive: bool) -> Result<(), FsError> {
        self.mkdir_at(path, recursive)
    }

    fn write_file(&mut self, path: &VirtualPath, contents: Bytes) -> Result<(), FsError> {
        self.write_file_at(path, contents)
    }
}

impl<T: InstallTarget + ?Sized> InstallTarget for &mut T {
    fn mkdir(&mut self, path: &VirtualPath, recursive: bool) -> Result<(), FsError> {
        (**self).mkdir(path, recursive)
    }

    fn write_file(&mut self, path: &VirtualPath, contents: Bytes) -> Result<(), FsError> {
        (**self).write_file(path, contents)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    /// Name of the nested `*.tar.gz` inside the outer archive.
    pub entry_name: String,
    /// Number of leading path components removed from every tar entry.
    pub strip_components: usize,
}

impl InstallOptions {
    pub fn new(entry_name: impl Into<String>) -> Self {
        InstallOptions {
            entry_name: entry_name.into(),
            strip_components: 0,
        }
    }

    pub fn with_strip_components(mut self, count: usize) -> Self {
        self.strip_components = count;
        self
    }
}

/// What an install wrote.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct InstallSummary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub struct Installer {
    options: InstallOptions,
    reporter: StatusReporter,
}

impl Installer {
    pub fn new(options: InstallOptions) -> Self {
        Installer {
            options,
            reporter: StatusReporter::silent(),
        }
    }

    pub fn with_reporter(mut self, reporter: StatusReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn options(&self) -> &InstallOptions {
        &self.options
    }

    /// Install the nested tarball from a zip archive into `target`.
    ///
    /// Entries are written in archive order and every write has completed
    /// by the time this returns. The first failure aborts the install.
    #[tracing::instrument(level = "debug", skip_all, fields(entry = %self.options.entry_name))]
    pub fn install<R, T>(&self, archive: R, target: &mut T) -> Result<InstallSummary, InstallError>
    where
        R: Read + Seek,
        T: InstallTarget + ?Sized,
    {
        self.reporter.notify(Status::Unpacking);

        let mut archive = ZipArchive::new(archive)?;
        let tarball = match archive.by_name(&self.options.entry_name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(InstallError::MissingExpectedEntry {
                    name: self.options.entry_name.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(
            compressed = tarball.compressed_size(),
            size = tarball.size(),
            "Found the tarball",
        );

        self.reporter.notify(Status::Installing);
        let summary = install_tarball(
            BufReader::new(tarball),
            target,
            self.options.strip_components,
        )?;
        self.reporter.notify(Status::Installed {
            files: summary.files,
        });

        Ok(summary)
    }
}

/// Install a `*.tar.gz` stream into `target`.
pub fn install_tarball<T>(
    tarball: impl BufRead,
    target: &mut T,
    strip_components: usize,
) -> Result<InstallSummary, InstallError>
where
    T: InstallTarget + ?Sized,
{
    let mut archive = Archive::new(GzDecoder::new(tarball));
    let mut summary = InstallSummary::default();

    for entry in archive.entries().map_err(InstallError::Tarball)? {
        let mut entry = entry.map_err(InstallError::Tarball)?;
        let raw_path = entry
            .path()
            .map_err(InstallError::Tarball)?
            .to_string_lossy()
            .into_owned();
        let entry_type = entry.header().entry_type();

        if entry_type.is_pax_global_extensions() {
            tracing::debug!(path = %raw_path, "Skipping a global extended header");
            continue;
        }

        let path = VirtualPath::parse(&raw_path).map_err(|source| InstallError::Filesystem {
            path: raw_path.clone(),
            source,
        })?;
        let Some(path) = path.strip_components(strip_components) else {
            tracing::trace!(path = %raw_path, "Skipping a stripped entry");
            continue;
        };
        let fs_error = |source: FsError| InstallError::Filesystem {
            path: path.to_string(),
            source,
        };

        if entry_type.is_dir() {
            target.mkdir(&path, true).map_err(fs_error)?;
            summary.directories += 1;
        } else if entry_type.is_file() {
            let mut contents = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            entry
                .read_to_end(&mut contents)
                .map_err(InstallError::Tarball)?;
            tracing::debug!(%path, len = contents.len(), "Installing file");

            summary.bytes += contents.len() as u64;
            target
                .write_file(&path, Bytes::from(contents))
                .map_err(fs_error)?;
            summary.files += 1;
        } else {
            return Err(InstallError::UnsupportedEntryKind {
                path: raw_path,
                kind: format!("{entry_type:?}").to_lowercase(),
            });
        }
    }

    Ok(summary)
}
