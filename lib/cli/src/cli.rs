//! The entrypoint for the `playground` binary.

use std::process::ExitCode;

use clap::Parser;

use crate::{
    commands::{CliCommand, Install, Run, Split},
    logging::Output,
};

/// Command-line arguments for the playground CLI.
#[derive(Parser, Debug)]
#[clap(
    name = "playground",
    about = "Run multi-file Ruby snippets inside a WebAssembly sandbox",
    version,
    author
)]
pub struct PlaygroundCmd {
    #[clap(flatten)]
    output: Output,
    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(clap::Subcommand, Debug)]
enum Cmd {
    /// Split a source file and run it with the sandboxed interpreter
    Run(Run),
    /// Show how a source file is split into separate files
    Split(Split),
    /// Install a distribution archive and list what it contains
    Install(Install),
}

impl PlaygroundCmd {
    fn execute(self) -> Result<ExitCode, anyhow::Error> {
        let PlaygroundCmd { output, cmd } = self;

        output.initialize_logging();

        match cmd {
            Cmd::Run(mut run) => {
                run.reporter = output.status_reporter();
                let code = run.run()?;
                Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
            }
            Cmd::Split(split) => split.run().map(|()| ExitCode::SUCCESS),
            Cmd::Install(mut install) => {
                install.reporter = output.status_reporter();
                install.run().map(|()| ExitCode::SUCCESS)
            }
        }
    }
}

/// The main function for the playground CLI tool.
pub fn playground_main() -> ExitCode {
    let cmd = PlaygroundCmd::parse();
    let colors = cmd.output.should_emit_colors();

    match cmd.execute() {
        Ok(code) => code,
        Err(e) => {
            let prefix = console::style("error").red().bold().force_styling(colors);
            eprintln!("{prefix}: {e}");
            for cause in e.chain().skip(1) {
                eprintln!("  caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}
