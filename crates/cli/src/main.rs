use std::process::ExitCode;

fn main() -> ExitCode {
    bidwright_cli::run()
}
