//! The bridge between a [`playground_vfs::FileSystem`] and a WASI instance.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use playground_vfs::{Node, VirtualPath};
use shared_buffer::OwnedBuffer;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedSender;
use virtual_fs::{mem_fs, DualWriteFile, FileSystem as _, NullFile, VirtualFile};
use wasmer::{Engine, Module, Store};
use wasmer_wasix::{WasiEnv, WasiEnvBuilder, WasiRuntimeError};

use crate::{HarnessError, RunOutcome};

/// Build the in-memory filesystem a WASI environment can mount from `fs`.
///
/// Files listed in `writable` are copied so the guest can change them. Every
/// other file is read-only and shares its contents with `fs`.
pub(crate) async fn mount(
    fs: &playground_vfs::FileSystem,
    writable: &BTreeSet<VirtualPath>,
) -> Result<mem_fs::FileSystem, virtual_fs::FsError> {
    let sandbox_fs = mem_fs::FileSystem::default();

    // parents are always visited before their children
    for (path, node) in fs.walk() {
        let host_path = PathBuf::from(path.to_string());
        match node {
            Node::Directory(_) => sandbox_fs.create_dir(&host_path)?,
            Node::File(contents) if writable.contains(&path) => {
                let mut file = sandbox_fs
                    .new_open_options()
                    .write(true)
                    .create_new(true)
                    .open(&host_path)?;
                file.write_all(contents).await?;
            }
            Node::File(contents) => {
                sandbox_fs.insert_ro_file(&host_path, OwnedBuffer::from_bytes(contents.clone()))?
            }
        }
    }

    Ok(sandbox_fs)
}

/// A fully resolved interpreter invocation.
#[derive(Debug)]
pub(crate) struct Invocation {
    pub program_name: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub fs: mem_fs::FileSystem,
}

/// A stdio file that forwards every write to `output`.
fn output_file(output: UnboundedSender<Vec<u8>>) -> Box<dyn VirtualFile + Send + Sync> {
    Box::new(DualWriteFile::new(
        Box::new(NullFile::default()),
        move |bytes: &[u8]| {
            // the receiver is only gone once the run has been abandoned
            let _ = output.send(bytes.to_vec());
        },
    ))
}

/// Run the interpreter to completion on the current thread.
#[tracing::instrument(level = "debug", skip_all, fields(program = %invocation.program_name))]
pub(crate) fn execute(
    engine: Engine,
    module: Module,
    invocation: Invocation,
    output: UnboundedSender<Vec<u8>>,
) -> Result<RunOutcome, HarnessError> {
    let Invocation {
        program_name,
        args,
        env,
        fs,
    } = invocation;

    tracing::debug!(?args, "Starting the interpreter");

    let mut builder = WasiEnv::builder(program_name);
    builder.set_engine(engine.clone());
    builder.add_args(&args);
    builder.add_envs(env);
    builder.set_fs(Box::new(fs));
    builder.add_preopen_dir("/")?;

    let builder = builder
        .stdin(Box::new(NullFile::default()))
        .stdout(output_file(output.clone()))
        .stderr(output_file(output.clone()));

    let mut store = Store::new(engine);

    match start(builder, module, &mut store) {
        Ok(()) => Ok(RunOutcome::Exited { code: 0 }),
        Err(e) => classify(e, &output),
    }
}

/// Instantiate the module and call its `_start` function.
fn start(
    builder: WasiEnvBuilder,
    module: Module,
    store: &mut Store,
) -> Result<(), WasiRuntimeError> {
    let (instance, env) = builder.instantiate(module, store)?;

    let result = instance
        .exports
        .get_function("_start")
        .map_err(WasiRuntimeError::from)
        .and_then(|entrypoint| {
            entrypoint
                .call(store, &[])
                .map(drop)
                .map_err(WasiRuntimeError::from)
        });

    env.on_exit(store, None);

    result
}

fn classify(
    error: WasiRuntimeError,
    output: &UnboundedSender<Vec<u8>>,
) -> Result<RunOutcome, HarnessError> {
    if let Some(code) = error.as_exit_code() {
        return Ok(RunOutcome::Exited { code: code.raw() });
    }

    match error {
        WasiRuntimeError::Init(_)
        | WasiRuntimeError::Export(_)
        | WasiRuntimeError::Instantiation(_) => Err(HarnessError::Start(error)),
        other => {
            let message = other.to_string();
            tracing::warn!(error = &other as &dyn std::error::Error, "The guest faulted");
            let _ = output.send(format!("{message}\n").into_bytes());
            Ok(RunOutcome::Faulted { message })
        }
    }
}
