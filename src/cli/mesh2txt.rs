//! `mesh2txt <file>`: dump the points of a mesh to `<file minus 3 chars>txt`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use log::info;

use super::{ensure_input, handle_error, setup, CliError, CommonArgs};
use crate::points::{extract_points, ExtractOutcome, PointFormat};

/// Write the vertex coordinates of a VTK or PLY mesh to a text file.
#[derive(Parser, Debug)]
#[command(name = "mesh2txt", version)]
struct Mesh2TxtArgs {
    /// Mesh file to read. The output replaces its last three characters with `txt`.
    /// Files after the first are ignored.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
    /// Fixed number of decimals per coordinate.
    #[arg(long, value_name = "DIGITS")]
    precision: Option<usize>,
    #[command(flatten)]
    common: CommonArgs,
}

pub fn run() -> ExitCode {
    let args = Mesh2TxtArgs::parse();

    let Some(input) = args.files.first().map(PathBuf::as_path) else {
        return print_usage();
    };

    let config = match setup(&args.common) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let mut format = config.point_format();
    if args.precision.is_some() {
        format.precision = args.precision;
    }

    match dump(input, &format) {
        Ok(ExtractOutcome::NoPoints) => {
            println!("No points found in {}", input.display());
            ExitCode::SUCCESS
        }
        Ok(ExtractOutcome::Written { path, count }) => {
            info!("{} points written to {}", count, path.display());
            ExitCode::SUCCESS
        }
        Err(err) => handle_error(&err, Some(input)),
    }
}

fn dump(input: &Path, format: &PointFormat) -> Result<ExtractOutcome, CliError> {
    ensure_input(input)?;
    let stdout = io::stdout();
    let mut report = stdout.lock();
    Ok(extract_points(input, format, &mut report)?)
}

fn print_usage() -> ExitCode {
    let mut command = Mesh2TxtArgs::command();
    if let Err(err) = command.print_help() {
        return handle_error(&CliError::Stdout(err), None);
    }
    let _ = io::stdout().flush();
    ExitCode::SUCCESS
}
