//! The commands available in the playground binary.

mod install;
mod run;
mod split;

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use playground_runner::HarnessConfig;

pub use self::{install::Install, run::Run, split::Split};

/// An executable CLI command.
pub(crate) trait CliCommand {
    type Output;

    fn run(self) -> Result<Self::Output, anyhow::Error>;
}

/// An executable CLI command that runs in an async context.
///
/// An [`AsyncCliCommand`] automatically implements [`CliCommand`] by creating
/// a new tokio runtime and blocking.
#[async_trait::async_trait]
pub(crate) trait AsyncCliCommand: Send + Sync {
    type Output: Send + Sync;

    async fn run_async(self) -> Result<Self::Output, anyhow::Error>;
}

impl<O: Send + Sync, C: AsyncCliCommand<Output = O>> CliCommand for C {
    type Output = O;

    fn run(self) -> Result<O, anyhow::Error> {
        tokio::runtime::Runtime::new()?.block_on(AsyncCliCommand::run_async(self))
    }
}

/// Read a source file, where `-` means stdin.
fn read_source(path: &Path) -> Result<String, anyhow::Error> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Unable to read the source from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Unable to read \"{}\"", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<HarnessConfig, anyhow::Error> {
    match path {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("Unable to load the config from \"{}\"", path.display())),
        None => Ok(HarnessConfig::default()),
    }
}
