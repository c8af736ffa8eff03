use clap::Parser;
use dirsort::cli::{Args, run_cli};
use dirsort::output::OutputFormatter;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = args
        .command()
        .and_then(|command| run_cli(command, args.config.as_deref()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Sends diagnostics to stderr; the level comes from the `-v` count only.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("dirsort={level}")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
