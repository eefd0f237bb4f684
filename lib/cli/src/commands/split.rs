use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use playground_runner::SplitSource;

use super::{read_source, CliCommand};

/// Show how a source file is split into separate files.
#[derive(Debug, clap::Parser)]
pub struct Split {
    /// Print the result as JSON
    #[clap(long)]
    pub(crate) json: bool,
    /// The source file, or `-` for stdin
    pub(crate) source: PathBuf,
}

impl CliCommand for Split {
    type Output = ();

    fn run(self) -> Result<(), anyhow::Error> {
        let text = read_source(&self.source)?;
        let split = playground_runner::split(&text);

        let mut stdout = std::io::stdout().lock();
        if self.json {
            serde_json::to_writer_pretty(&mut stdout, &split)
                .context("Unable to serialize the result")?;
            writeln!(stdout)?;
        } else {
            stdout.write_all(render(&split).as_bytes())?;
        }

        Ok(())
    }
}

fn render(split: &SplitSource) -> String {
    let mut out = String::new();

    out.push_str("=== (main) ===\n");
    out.push_str(&split.remaining);

    for file in split.files.values() {
        out.push_str(&format!(
            "=== {} (line {}) ===\n",
            file.name,
            file.source_line + 1
        ));
        out.push_str(&file.content);
    }

    out
}
