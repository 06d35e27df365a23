//! `travelform`: generate travel-expense forms from the configured roster.
//!
//! Run configuration comes from the presets in `travelform_io_xlsx::conf`.
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;
use travelform_io_xlsx::{derive_default_run_config, generate_forms};

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let spec_run = match derive_default_run_config() {
        Ok(val) => val,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match generate_forms(&spec_run) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
