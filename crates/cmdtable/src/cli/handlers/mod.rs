mod describe;
mod invoke;
mod list;

use anyhow::Result;
use clap::ArgMatches;
use cmdtable_core::{CatalogReport, CommandRegistry};

pub use describe::{describe_command, handle_describe};
pub use invoke::{collect_values, dispatch_plan, handle_invoke, invoke};
pub use list::handle_list;

pub fn dispatch(matches: &ArgMatches, registry: &CommandRegistry, report: &CatalogReport) -> Result<()> {
    match matches.subcommand() {
        Some(("list", sub_m)) => handle_list(sub_m, registry, report),
        Some(("describe", sub_m)) => handle_describe(sub_m, registry),
        Some((word, sub_m)) => handle_invoke(word, sub_m, registry),
        None => anyhow::bail!("Unknown command. Run 'cmdtable --help' for usage."),
    }
}
