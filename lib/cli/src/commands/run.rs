use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use bytes::Bytes;
use playground_package::{Status, StatusReporter};
use playground_runner::{Action, ExecutionRequest, RunOutcome, Worker};

use super::{load_config, read_source, AsyncCliCommand};

/// Split a source file and run it with the sandboxed interpreter.
#[derive(Debug, clap::Parser)]
pub struct Run {
    /// The zip archive containing the interpreter distribution
    #[clap(long, env = "PLAYGROUND_ARCHIVE")]
    pub(crate) archive: PathBuf,
    /// A TOML file describing the distribution
    #[clap(long, env = "PLAYGROUND_CONFIG")]
    pub(crate) config: Option<PathBuf>,
    /// What the interpreter should do with the source
    #[clap(long, default_value = "evaluate")]
    pub(crate) action: Action,
    /// Where the main buffer is placed inside the sandbox
    #[clap(long = "main", default_value = "/main.rb")]
    pub(crate) main_path: String,
    /// The source file, or `-` for stdin
    pub(crate) source: PathBuf,
    /// Arguments passed to the program after the main file
    #[clap(last = true)]
    pub(crate) args: Vec<String>,
    #[clap(skip)]
    pub(crate) reporter: StatusReporter,
}

#[async_trait::async_trait]
impl AsyncCliCommand for Run {
    type Output = i32;

    async fn run_async(self) -> Result<i32, anyhow::Error> {
        let config = load_config(self.config.as_deref())?;
        let source = read_source(&self.source)?;

        self.reporter.notify(Status::Fetching);
        let archive = tokio::fs::read(&self.archive)
            .await
            .with_context(|| format!("Unable to read \"{}\"", self.archive.display()))?;
        let len = archive.len() as u64;
        self.reporter.notify(Status::Downloading {
            received: len,
            total: Some(len),
        });

        let worker = Worker::spawn(config).context("Unable to start the sandbox")?;
        worker
            .prepare(Bytes::from(archive), self.reporter.clone())
            .await
            .context("Unable to prepare the sandbox")?;

        let request = ExecutionRequest::from_source(&source, &self.main_path, self.action)
            .with_args(self.args);

        let mut stdout = std::io::stdout();
        let result = worker
            .run(request)
            .wait(|text| {
                // a closed stdout isn't worth aborting the run for
                let _ = stdout.write_all(text.as_bytes());
                let _ = stdout.flush();
            })
            .await;
        worker.terminate();

        match result {
            Ok(RunOutcome::Exited { code }) => {
                tracing::debug!(code, "The program exited");
                Ok(code)
            }
            Ok(RunOutcome::Faulted { message }) => {
                tracing::warn!(%message, "The program faulted");
                Ok(1)
            }
            Err(message) => Err(anyhow::Error::msg(message).context("The run failed")),
        }
    }
}
