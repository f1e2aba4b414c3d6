use std::process::ExitCode;

fn main() -> ExitCode {
    polykit::cli::meshconv::run()
}
