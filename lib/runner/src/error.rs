use std::error::Error as _;

use playground_package::InstallError;
use playground_vfs::FsError;
use wasmer_wasix::{WasiRuntimeError, WasiStateCreationError};

/// Errors that stop a harness from being prepared or a run from starting.
///
/// Faults raised by the guest while it runs are not errors, they end up in
/// [`RunOutcome::Faulted`](crate::RunOutcome::Faulted).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HarnessError {
    #[error("Unable to install the distribution")]
    Install(#[from] InstallError),
    #[error("Unable to write \"{path}\"")]
    Filesystem {
        path: String,
        #[source]
        source: FsError,
    },
    #[error("The interpreter wasn't found at \"{path}\"")]
    MissingInterpreter { path: String },
    #[error("Unable to compile the interpreter")]
    Compile(#[from] wasmer::CompileError),
    #[error("Unknown action \"{0}\"")]
    UnknownAction(String),
    #[error("Unable to populate the sandbox filesystem")]
    Sandbox(#[from] virtual_fs::FsError),
    #[error("Unable to set up the WASI environment")]
    Environment(#[from] WasiStateCreationError),
    #[error("Unable to start the interpreter")]
    Start(#[source] WasiRuntimeError),
    #[error("The sandbox task panicked or was cancelled")]
    Join(#[from] tokio::task::JoinError),
    #[error("The harness hasn't been prepared")]
    NotReady,
    #[error("Unable to start the worker")]
    Worker(#[source] std::io::Error),
    #[error("The worker has shut down")]
    WorkerGone,
}

impl HarnessError {
    /// The error and all of its causes on a single line, suitable for a
    /// status bar.
    pub fn status_line(&self) -> String {
        let mut line = self.to_string();
        let mut source = self.source();

        while let Some(cause) = source {
            line.push_str(": ");
            line.push_str(&cause.to_string());
            source = cause.source();
        }

        line
    }
}
