use anyhow::Result;
use clap::ArgMatches;
use cmdtable_core::{Command, CommandRegistry, ParameterDescriptor};
use serde::Serialize;
use serde_json::{json, Value};

/// Heading for parameters that carry no argument group.
const DEFAULT_GROUP: &str = "Arguments";

#[derive(Debug, Serialize)]
struct ArgumentGroup<'a> {
    name: &'a str,
    parameters: Vec<&'a ParameterDescriptor>,
}

pub fn handle_describe(matches: &ArgMatches, registry: &CommandRegistry) -> Result<()> {
    let name = matches
        .get_many::<String>("name")
        .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let command = registry.lookup(&name)?;
    println!("{}", serde_json::to_string_pretty(&describe_command(command))?);
    Ok(())
}

/// JSON description of `command` with parameters grouped by argument group.
///
/// Groups appear in order of first use, so the storage account group added
/// during registration comes first.
pub fn describe_command(command: &Command) -> Value {
    let groups = command
        .parameters()
        .iter()
        .fold(Vec::<ArgumentGroup<'_>>::new(), |mut groups, param| {
            let name = param.group().unwrap_or(DEFAULT_GROUP);
            match groups.iter_mut().find(|group| group.name == name) {
                Some(group) => group.parameters.push(param),
                None => groups.push(ArgumentGroup {
                    name,
                    parameters: vec![param],
                }),
            }
            groups
        });

    json!({
        "name": command.name(),
        "group": command.group(),
        "operation": command.operation(),
        "hooks": {
            "transform": command.transform().is_some(),
            "table_transformer": command.table_transformer().is_some(),
            "exception_handler": command.exception_handler().is_some(),
        },
        "argument_groups": groups,
    })
}
