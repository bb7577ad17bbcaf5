//! Process entry point for the `pkgcli` binary.
//!
//! Wires the real collaborators (standard streams, the TOML settings file and
//! the package engine) into a [`Dispatcher`] and turns its result into an
//! exit code.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use super::dispatch::{Dispatcher, Services};
use super::registry::CommandRegistry;
use crate::console::SystemConsole;
use crate::engine::UnconfiguredEngine;
use crate::settings::TomlSettingsLoader;

/// Environment variable holding the log filter, e.g. `PKGCLI_LOG=debug`.
pub const LOG_ENV: &str = "PKGCLI_LOG";

/// Install the stderr log subscriber. Defaults to `warn`.
///
/// Logs never go to stdout, which carries command output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Run the CLI with the process arguments. This is the whole main() body.
pub fn run() -> ExitCode {
    init_tracing();

    let argv: Vec<String> = std::env::args().skip(1).collect();

    let working_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("Unable to determine the current directory: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let registry = match CommandRegistry::builtin() {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let services = Services {
        console: Arc::new(SystemConsole::new()),
        settings: Arc::new(TomlSettingsLoader),
        engine: Arc::new(UnconfiguredEngine),
        working_dir,
    };

    match Dispatcher::new(registry, services).run(&argv) {
        Ok(code) => exit_code(code),
        Err(err) => {
            tracing::error!(error = ?err, "command failed unexpectedly");
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code)
        .map(ExitCode::from)
        .unwrap_or(ExitCode::FAILURE)
}
