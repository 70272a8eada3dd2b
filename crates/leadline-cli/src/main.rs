#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    leadline_cli::main_entry()
}
