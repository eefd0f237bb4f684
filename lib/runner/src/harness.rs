use std::collections::BTreeSet;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use playground_package::{Installer, Status, StatusReporter};
use playground_vfs::{FileSystem, VirtualPath};
use tokio::sync::mpsc;
use wasmer::{Engine, Module};

use crate::{
    sandbox::{self, Invocation},
    Action, ExecutionRequest, HarnessConfig, HarnessError, RunOutcome, Utf8Decoder,
};

/// A prepared interpreter and the filesystem it was installed into.
///
/// The harness never changes after [`Harness::prepare`] returns. Every run
/// works on its own copy of the filesystem, so runs can't observe each
/// other and a failed run leaves the harness usable. Cloning is cheap.
#[derive(Clone)]
pub struct Harness {
    inner: Arc<Inner>,
}

struct Inner {
    config: HarnessConfig,
    engine: Engine,
    module: Module,
    base: FileSystem,
}

impl Harness {
    /// Install `archive` into an empty filesystem and compile the interpreter
    /// it contains.
    #[tracing::instrument(level = "debug", skip_all, fields(archive.len = archive.len()))]
    pub async fn prepare(
        config: HarnessConfig,
        archive: Bytes,
        reporter: StatusReporter,
    ) -> Result<Self, HarnessError> {
        tokio::task::spawn_blocking(move || Harness::prepare_blocking(config, archive, reporter))
            .await?
    }

    /// The synchronous version of [`Harness::prepare`].
    pub fn prepare_blocking(
        config: HarnessConfig,
        archive: Bytes,
        reporter: StatusReporter,
    ) -> Result<Self, HarnessError> {
        let installer =
            Installer::new(config.archive.install_options()).with_reporter(reporter.clone());

        let mut base = FileSystem::new();
        let summary = installer.install(Cursor::new(archive), &mut base)?;
        tracing::debug!(
            files = summary.files,
            directories = summary.directories,
            bytes = summary.bytes,
            "Installed the distribution",
        );

        Harness::from_filesystem(config, base, reporter)
    }

    /// Use an already populated filesystem.
    pub fn from_filesystem(
        config: HarnessConfig,
        base: FileSystem,
        reporter: StatusReporter,
    ) -> Result<Self, HarnessError> {
        reporter.notify(Status::Loading);

        let interpreter_path = &config.interpreter.path;
        let binary = base
            .read_file(interpreter_path)
            .map_err(|_| HarnessError::MissingInterpreter {
                path: interpreter_path.clone(),
            })?;

        let engine = Engine::default();
        let module = Module::new(&engine, &binary)?;
        tracing::debug!(path = %interpreter_path, len = binary.len(), "Compiled the interpreter");

        reporter.notify(Status::Ready);

        Ok(Harness {
            inner: Arc::new(Inner {
                config,
                engine,
                module,
                base,
            }),
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.inner.config
    }

    /// The filesystem every run starts from.
    pub fn filesystem(&self) -> &FileSystem {
        &self.inner.base
    }

    /// Run the interpreter once, passing its output to `on_output` in the
    /// order it was written.
    ///
    /// Resolves once the interpreter has exited or faulted and every chunk of
    /// output has been delivered.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(main = %request.main_path, action = %request.action),
    )]
    pub async fn run(
        &self,
        request: ExecutionRequest,
        mut on_output: impl FnMut(&str),
    ) -> Result<RunOutcome, HarnessError> {
        let action: Action = request.action.parse()?;
        let invocation = self.invocation(&request, action).await?;

        let (sender, mut receiver) = mpsc::unbounded_channel::<Vec<u8>>();
        let engine = self.inner.engine.clone();
        let module = self.inner.module.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            sandbox::execute(engine, module, invocation, sender)
        });

        let mut decoder = Utf8Decoder::new();
        let mut emit = |chunk: &[u8]| {
            let text = decoder.decode(chunk);
            if !text.is_empty() {
                on_output(&text);
            }
        };

        let result = loop {
            tokio::select! {
                Some(chunk) = receiver.recv() => emit(&chunk),
                joined = &mut task => break joined,
            }
        };

        // stdio may still be holding senders after the task has finished
        while let Ok(chunk) = receiver.try_recv() {
            emit(&chunk);
        }
        drop(emit);

        let tail = decoder.finish();
        if !tail.is_empty() {
            on_output(&tail);
        }

        let outcome = result??;
        tracing::debug!(%outcome, "Run complete");

        Ok(outcome)
    }

    /// Merge the request's files into a copy of the base filesystem and
    /// mount the result. Only the request's own files are writable.
    async fn invocation(
        &self,
        request: &ExecutionRequest,
        action: Action,
    ) -> Result<Invocation, HarnessError> {
        let mut fs = self.inner.base.clone();
        let mut writable = BTreeSet::new();

        for (path, contents) in &request.files {
            let error = |source| HarnessError::Filesystem {
                path: path.clone(),
                source,
            };
            let parsed = VirtualPath::parse(path).map_err(error)?;
            fs.write_file_at(&parsed, contents.clone()).map_err(error)?;
            writable.insert(parsed);
        }

        let interpreter = &self.inner.config.interpreter;

        Ok(Invocation {
            program_name: interpreter.program_name.clone(),
            args: request.args(action),
            env: interpreter.env.clone(),
            fs: sandbox::mount(&fs, &writable).await?,
        })
    }
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
