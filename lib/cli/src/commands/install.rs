use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use playground_package::{Installer, Status, StatusReporter};
use playground_vfs::{FileSystem, Node};

use super::{load_config, CliCommand};

/// Install a distribution archive and list what it contains.
#[derive(Debug, clap::Parser)]
pub struct Install {
    /// The zip archive containing the interpreter distribution
    #[clap(long, env = "PLAYGROUND_ARCHIVE")]
    pub(crate) archive: PathBuf,
    /// A TOML file describing the distribution
    #[clap(long, env = "PLAYGROUND_CONFIG")]
    pub(crate) config: Option<PathBuf>,
    #[clap(skip)]
    pub(crate) reporter: StatusReporter,
}

impl CliCommand for Install {
    type Output = ();

    fn run(self) -> Result<(), anyhow::Error> {
        let config = load_config(self.config.as_deref())?;

        self.reporter.notify(Status::Fetching);
        let archive = File::open(&self.archive)
            .with_context(|| format!("Unable to open \"{}\"", self.archive.display()))?;

        let installer =
            Installer::new(config.archive.install_options()).with_reporter(self.reporter.clone());
        let mut fs = FileSystem::new();
        let summary = installer
            .install(BufReader::new(archive), &mut fs)
            .with_context(|| format!("Unable to install \"{}\"", self.archive.display()))?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(list(&fs).as_bytes())?;

        tracing::info!(
            files = summary.files,
            directories = summary.directories,
            bytes = summary.bytes,
            "Installed",
        );

        if !fs.is_file(&config.interpreter.path) {
            tracing::warn!(
                path = %config.interpreter.path,
                "The distribution doesn't contain the configured interpreter",
            );
        }

        Ok(())
    }
}

/// One line per entry, directories marked with a trailing slash.
fn list(fs: &FileSystem) -> String {
    let mut out = String::new();

    for (path, node) in fs.walk() {
        match node {
            Node::Directory(_) => out.push_str(&format!("{path}/\n")),
            Node::File(contents) => out.push_str(&format!("{path}\t{}\n", contents.len())),
        }
    }

    out
}
