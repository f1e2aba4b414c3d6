//! `meshconv <infile> <outfile>`: re-serialize a mesh, ASCII unless told otherwise.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use log::info;

use super::{ensure_input, handle_error, setup, CliError, CommonArgs};
use crate::convert::{convert, same_file, ConvertReport};
use crate::io::{Encoding, Endianness, WriteOptions};

/// Convert a VTK or PLY mesh file, by default from binary to ASCII encoding.
#[derive(Parser, Debug)]
#[command(name = "meshconv", version)]
struct MeshConvArgs {
    /// Input mesh file followed by the output file.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
    /// Write binary instead of ASCII.
    #[arg(long, conflicts_with = "ascii")]
    binary: bool,
    /// Write ASCII even if the config asks for binary.
    #[arg(long)]
    ascii: bool,
    /// Big-endian byte order for binary PLY output.
    #[arg(long)]
    big_endian: bool,
    #[command(flatten)]
    common: CommonArgs,
}

impl MeshConvArgs {
    fn apply_overrides(&self, options: &mut WriteOptions) {
        if self.binary {
            options.encoding = Encoding::Binary;
        }
        if self.ascii {
            options.encoding = Encoding::Ascii;
        }
        if self.big_endian {
            options.byte_order = Endianness::Big;
        }
    }
}

pub fn run() -> ExitCode {
    let args = MeshConvArgs::parse();

    let [input, output] = args.files.as_slice() else {
        return print_usage();
    };

    if same_file(input, output) {
        println!("Input and output must be different files: {}", input.display());
        return ExitCode::SUCCESS;
    }

    let config = match setup(&args.common) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let mut options = config.write_options();
    args.apply_overrides(&mut options);

    let result = ensure_input(input)
        .and_then(|()| convert(input, output, &options).map_err(CliError::from));
    match result {
        Ok(ConvertReport { points, cells, .. }) => {
            info!("{} points, {} cells", points, cells);
            ExitCode::SUCCESS
        }
        Err(err) => handle_error(&err, Some(input)),
    }
}

fn print_usage() -> ExitCode {
    let mut command = MeshConvArgs::command();
    if let Err(err) = command.print_help() {
        return handle_error(&CliError::Stdout(err), None);
    }
    let _ = io::stdout().flush();
    ExitCode::SUCCESS
}
