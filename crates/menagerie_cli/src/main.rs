//! `menagerie` demo entry point.
//!
//! # Responsibility
//! - Load `.env` and the process environment once into an `AppConfig`.
//! - Wire config -> database -> scope -> repository and run the demo.
//! - Print the result; print failures and exit non-zero.

use log::error;
use menagerie_core::{init_logging, run_demo, AppConfig, Database};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=demo_run module=cli status=error error={err}");
            println!("An error occurred: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<String, Box<dyn Error>> {
    // A missing .env file is normal; the environment alone is enough.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()?;
    if let Err(err) = init_logging(&config.log.level, config.log.dir.as_deref()) {
        eprintln!("logging disabled: {err}");
    }

    let db = Database::connect(&config.database)?;
    let outcome = run_demo(&db)?;
    Ok(outcome.report())
}
