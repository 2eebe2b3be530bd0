use std::process::ExitCode;

fn main() -> ExitCode {
    meddpicc_cli::run()
}
