//! CLI command implementations

pub mod account;
pub mod logs;
pub mod recover;
pub mod status;
pub mod transfers;
pub mod withdraw;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use strongbox_core::{
    Amount, EntryPoint, Identity, LogEvent, LoggingService, StrongboxContext,
};
use tracing::debug;

use crate::output;

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STRONGBOX_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory; set STRONGBOX_DIR")?;
    Ok(home.join(".strongbox"))
}

/// Open the context, taking the data directory lock
pub fn get_context() -> Result<StrongboxContext> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
    debug!(data_dir = %data_dir.display(), "opening context");
    StrongboxContext::new(&data_dir).context("Failed to initialize strongbox context")
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (never blocks operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// The acting identity from `--as` / STRONGBOX_IDENTITY
pub fn caller(identity: Option<&str>) -> Result<Identity> {
    let raw = identity.ok_or_else(|| {
        anyhow!("No identity given; pass --as <identity> or set STRONGBOX_IDENTITY")
    })?;
    Ok(Identity::new(raw)?)
}

/// An explicit owner argument, falling back to the caller
pub fn owner_or_caller(identity: Option<&str>, owner: Option<&str>) -> Result<Identity> {
    match owner {
        Some(o) => Ok(Identity::new(o)?),
        None => caller(identity),
    }
}

pub fn parse_amount(ctx: &StrongboxContext, input: &str) -> Result<Amount> {
    Amount::parse_units(input, ctx.config.units.decimals)
        .with_context(|| format!("Invalid amount '{}'", input))
}

/// Run a custody operation, recording the outcome in the event log
///
/// In JSON mode a failure is also printed as an OperationResult envelope.
pub fn execute<T>(
    command: &str,
    operation: &str,
    json: bool,
    op: impl FnOnce() -> strongbox_core::Result<T>,
) -> Result<T> {
    let logger = get_logger();
    match op() {
        Ok(value) => {
            log_event(
                &logger,
                LogEvent::new("command_executed")
                    .with_command(command)
                    .with_operation(operation),
            );
            Ok(value)
        }
        Err(e) => {
            if let Some(l) = &logger {
                let _ = l.log_failure(command, operation, &e);
            }
            if json {
                let message = e.to_string();
                output::print_json_failure(e)?;
                return Err(anyhow!(message));
            }
            Err(e.into())
        }
    }
}
