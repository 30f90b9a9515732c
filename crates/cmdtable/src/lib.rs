//! Cmdtable - Command-line front end for the storage command table
//!
//! Builds the command table for the selected API profile, then exposes it
//! as a `clap` tree alongside `list` and `describe` introspection commands.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod cli;

use anyhow::Result;
use cmdtable_core::{config, register_storage_commands, CommandRegistry};

/// Load configuration, populate the registry and dispatch `args`.
///
/// # Errors
///
/// Returns error if configuration is invalid, registration fails or the
/// invoked command fails.
pub async fn run(args: Vec<String>) -> Result<()> {
    let config = config::load_config(cli::profile_from_args(&args)).await?;
    let profile = config.api_profile()?;

    let mut registry = CommandRegistry::new();
    let report = register_storage_commands(&mut registry, &profile)?;
    tracing::debug!(
        profile = %profile.name(),
        registered = report.registered.len(),
        skipped = report.skipped.len(),
        "Command table ready"
    );
    let registry = registry.into_shared();

    let matches = cli::build_cli(&registry).get_matches_from(args);
    cli::handlers::dispatch(&matches, &registry, &report)
}
