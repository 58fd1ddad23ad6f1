use std::process::ExitCode;

use clap::Parser;
use vm_core::vm_error;
use vm_template::cli::{self, Args};

fn main() -> ExitCode {
    let log_guard = vm_logging::init_subscriber();
    let args = Args::parse();
    let result = cli::execute(args);
    drop(log_guard);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            vm_error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
