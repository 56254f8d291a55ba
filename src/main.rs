use std::process::ExitCode;

fn main() -> ExitCode {
    glossa::cli::run()
}
