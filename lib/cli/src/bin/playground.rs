use std::process::ExitCode;

fn main() -> ExitCode {
    playground_cli::playground_main()
}
