use std::process::ExitCode;

fn main() -> ExitCode {
    reviewlens_cli::run()
}
