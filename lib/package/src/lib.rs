//! Turns a distributable archive into a populated [`playground_vfs::FileSystem`].
//!
//! Distributions are shipped as a zip file holding a single gzip-compressed
//! tarball at a well-known entry name. [`Installer`] locates that entry,
//! streams it through the decoders and replays every tar entry against an
//! [`InstallTarget`].

mod installer;
mod status;

pub use installer::{
    install_tarball, InstallError, InstallOptions, InstallSummary, InstallTarget, Installer,
};
pub use status::{Status, StatusReporter};
