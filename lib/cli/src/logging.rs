//! Logging and terminal output.

use playground_package::StatusReporter;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Control the output generated by the CLI.
#[derive(Debug, Clone, PartialEq, clap::Parser)]
pub struct Output {
    /// Generate verbose output (repeat for more verbosity)
    #[clap(short, long, action = clap::ArgAction::Count, global = true, conflicts_with = "quiet")]
    pub verbose: u8,
    /// Don't print progress messages
    #[clap(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
    /// When to use coloured output
    #[clap(long, default_value_t = clap::ColorChoice::Auto, global = true)]
    pub color: clap::ColorChoice,
}

impl Output {
    /// Initialize logging based on the `$RUST_LOG` environment variable,
    /// falling back to the verbosity flags.
    pub fn initialize_logging(&self) {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .with_ansi(self.should_emit_colors())
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .compact();

        let filter_layer = EnvFilter::builder()
            .with_default_directive(self.log_level().into())
            .from_env_lossy();

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }

    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }

        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Check whether we should emit ANSI escape codes.
    ///
    /// `tracing-subscriber` has no notion of `--color=always|never|auto`, so
    /// this decides it up front.
    pub fn should_emit_colors(&self) -> bool {
        match self.color {
            clap::ColorChoice::Always => true,
            clap::ColorChoice::Never => false,
            clap::ColorChoice::Auto => {
                console::Term::stderr().features().colors_supported()
                    && std::env::var_os("NO_COLOR").is_none()
            }
        }
    }

    /// A reporter that prints every status change to stderr, unless `--quiet`
    /// was passed.
    pub fn status_reporter(&self) -> StatusReporter {
        if self.quiet {
            return StatusReporter::silent();
        }

        let colors = self.should_emit_colors();
        StatusReporter::new(move |status| {
            let line = console::style(status).dim().force_styling(colors);
            eprintln!("{line}");
        })
    }
}
