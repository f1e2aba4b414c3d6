use std::process::ExitCode;

fn main() -> ExitCode {
    polykit::cli::meshinfo::run()
}
