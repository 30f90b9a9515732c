use anyhow::Result;
use clap::ArgMatches;
use cmdtable_core::{CatalogReport, CommandRegistry};
use serde_json::json;

/// Print one JSON object per command, ordered by name.
pub fn handle_list(matches: &ArgMatches, registry: &CommandRegistry, report: &CatalogReport) -> Result<()> {
    let prefix = matches.get_one::<String>("prefix").map_or("", String::as_str);

    if matches.get_flag("skipped") {
        let prefix_words: Vec<&str> = prefix.split_whitespace().collect();
        for name in report.skipped.iter().filter(|name| {
            let words: Vec<&str> = name.split_whitespace().collect();
            words.starts_with(&prefix_words)
        }) {
            println!("{}", json!({ "name": name, "skipped": true }));
        }
        return Ok(());
    }

    for command in registry.commands_under(prefix) {
        let line = json!({
            "name": command.name(),
            "group": command.group(),
            "operation": command.operation(),
            "parameters": command.parameters().len(),
        });
        println!("{line}");
    }
    Ok(())
}
