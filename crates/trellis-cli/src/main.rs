//! Trellis CLI entry point.

use std::{
    io::{self, Write},
    process::ExitCode,
    str::FromStr,
};

use clap::Parser;
use log::{LevelFilter, debug, info};
use miette::GraphicalReportHandler;

use trellis::TrellisError;
use trellis_cli::{Args, error_adapter::to_reportables, exit_code};

fn main() -> ExitCode {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logger(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"); "Starting Trellis");
    debug!(args:?; "Parsed arguments");

    match trellis_cli::run(&args) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            let code = exit_code(&err);
            debug!(code; "Exiting after failure");
            ExitCode::from(code)
        }
    }
}

fn init_logger(level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .init();
}

/// Renders every diagnostic of `err` to stderr, independent of the log level.
fn report(err: &TrellisError) {
    let reporter = GraphicalReportHandler::new();
    let mut stderr = io::stderr().lock();
    for reportable in to_reportables(err) {
        let mut rendered = String::new();
        if reporter.render_report(&mut rendered, &reportable).is_err() {
            rendered = format!("{reportable}\n");
        }
        // Nothing sensible is left to do if stderr is gone.
        let _ = stderr.write_all(rendered.as_bytes());
    }
}
