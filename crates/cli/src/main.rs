use std::process::ExitCode;

fn main() -> ExitCode {
    tiendita_cli::run()
}
