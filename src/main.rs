use std::io::{self, Write};

use clap::Parser;

use procview::cli::Cli;
use procview::error::ProcError;
use procview::output;
use procview::process;

fn exit_code(err: &ProcError) -> i32 {
    match err {
        ProcError::PermissionDenied(_) => 1,
        ProcError::Unavailable(_) => 2,
        ProcError::Serialization(_) => 4,
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(cli)));

    match result {
        Ok(Ok(())) => std::process::exit(0),
        Ok(Err(e)) => {
            eprintln!("error: {e}");
            std::process::exit(exit_code(&e));
        }
        Err(_) => {
            eprintln!("error: fatal: unexpected panic");
            std::process::exit(4);
        }
    }
}

fn run(cli: Cli) -> Result<(), ProcError> {
    let processes = process::list_processes()?;
    let degraded = processes.iter().filter(|p| p.is_degraded()).count();
    log::info!(
        "Snapshot: {} processes, {} with unavailable detail",
        processes.len(),
        degraded
    );

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    output::write_snapshot(&processes, cli.format, cli.sort, &mut out)?;
    out.flush().map_err(ProcError::Serialization)
}
