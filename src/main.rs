//! Binary entry point: parse arguments, solve, report.

use std::process::ExitCode;

/// Global allocator, for performance on allocation-heavy instances.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> ExitCode {
    env_logger::init();
    sat_tether::command_line::cli::run()
}
