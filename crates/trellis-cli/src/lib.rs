//! CLI logic for the Trellis layout tool.
//!
//! Reads a DOT file, applies a layout, refreshes the advisory attributes and
//! writes the result back as DOT.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io::Write};

use log::{info, warn};

use trellis::{Algorithm, Document, LayoutOptions, TrellisError, advisor};

/// Exit status for input that does not parse as DOT.
pub const EXIT_PARSE: u8 = 2;

/// Exit status for a configuration file that is missing or malformed.
pub const EXIT_CONFIG: u8 = 3;

/// Exit status for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Process exit status for a failed [`run`].
///
/// Scripts can tell a bad input file from a bad configuration from a layout
/// or I/O failure without parsing stderr.
pub fn exit_code(err: &TrellisError) -> u8 {
    match err {
        TrellisError::Parse { .. } => EXIT_PARSE,
        TrellisError::Config(_) => EXIT_CONFIG,
        TrellisError::Io(_) | TrellisError::Graph(_) | TrellisError::Layout(_) => EXIT_FAILURE,
    }
}

/// Run the Trellis CLI application
///
/// # Errors
///
/// Returns `TrellisError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Unknown algorithms and layout failures
pub fn run(args: &Args) -> Result<(), TrellisError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing graph"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;

    let mut document = Document::with_config(trellis::import_text(&source)?, app_config.layout());

    if args.suggest {
        let suggestions = trellis::suggest_layouts(&document.read());
        let mut stdout = std::io::stdout().lock();
        for name in suggestions {
            writeln!(stdout, "{name}")?;
        }
        return Ok(());
    }

    let algorithm = match &args.algorithm {
        Some(name) => name.parse::<Algorithm>()?,
        None => match app_config.layout().algorithm() {
            Some(algorithm) => algorithm,
            None => first_suggestion(&document),
        },
    };

    let respect = args.respect_collapsed || app_config.layout().respect_collapsed_containers();
    document.set_options(
        LayoutOptions::from(app_config.layout()).with_respect_collapsed_containers(respect),
    );

    let assignment = document.apply_layout(algorithm)?;
    for diagnostic in assignment.diagnostics() {
        warn!(algorithm = algorithm.name(); "{diagnostic}");
    }
    document.refresh_advisory();

    let text = document.export_text();
    match &args.output {
        Some(path) => {
            fs::write(path, text)?;
            info!(output_file = path, algorithm = algorithm.name(); "Graph exported successfully");
        }
        None => std::io::stdout().lock().write_all(text.as_bytes())?,
    }

    Ok(())
}

fn first_suggestion(document: &Document) -> Algorithm {
    advisor::suggest(&document.read())
        .first()
        .copied()
        .unwrap_or(Algorithm::Grid)
}
