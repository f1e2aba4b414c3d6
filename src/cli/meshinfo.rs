//! `meshinfo <file>`: print the characteristics of a mesh.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use super::{ensure_input, handle_error, setup, CliError, CommonArgs};
use crate::info::Characteristics;
use crate::io::read_poly_data;

/// Print point and cell counts, bounds and scalar range of a VTK or PLY mesh.
#[derive(Parser, Debug)]
#[command(name = "meshinfo", version)]
struct MeshInfoArgs {
    /// Mesh file to inspect.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
    /// Print JSON instead of the text block.
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    common: CommonArgs,
}

pub fn run() -> ExitCode {
    let args = MeshInfoArgs::parse();

    let Some(input) = args.input.as_deref() else {
        let mut command = MeshInfoArgs::command();
        if let Err(err) = command.print_help() {
            return handle_error(&CliError::Stdout(err), None);
        }
        return ExitCode::SUCCESS;
    };

    if let Err(code) = setup(&args.common) {
        return code;
    }

    match describe(input, args.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => handle_error(&err, Some(input)),
    }
}

fn describe(input: &Path, json: bool) -> Result<(), CliError> {
    ensure_input(input)?;
    let data = read_poly_data(input)?;
    let info = Characteristics::of(&data);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &info)?;
        writeln!(out).map_err(CliError::Stdout)?;
    } else {
        write!(out, "{}", info).map_err(CliError::Stdout)?;
    }
    out.flush().map_err(CliError::Stdout)
}
