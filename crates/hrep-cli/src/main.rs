use hrep_core::logging;
use hrep_core::ReplicateError;

mod cli;

use crate::cli::Cli;

fn main() {
    // Initialize logging as early as possible; fall back to stderr if the state dir is unusable.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", err);
    }

    match Cli::run_from_args() {
        Ok(outcome) => {
            println!("hrep: {} bytes replicated", outcome.bytes);
        }
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("hrep error: {:#}", err);
            let usage = err
                .downcast_ref::<ReplicateError>()
                .map(ReplicateError::is_usage)
                .unwrap_or(false);
            std::process::exit(if usage { 2 } else { 1 });
        }
    }
}
