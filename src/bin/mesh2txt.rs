use std::process::ExitCode;

fn main() -> ExitCode {
    polykit::cli::mesh2txt::run()
}
