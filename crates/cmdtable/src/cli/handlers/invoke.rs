use anyhow::Result;
use clap::ArgMatches;
use cmdtable_core::{
    storage::{ACCOUNT_KEY, CONNECTION_STRING, SAS_TOKEN},
    ArgValues, Command, CommandRegistry,
};
use serde_json::{json, Map, Value};

/// Argument values never echoed back in a dispatch plan.
const SECRET_PARAMETERS: [&str; 3] = [ACCOUNT_KEY, CONNECTION_STRING, SAS_TOKEN];

const REDACTED: &str = "***";

/// Resolve the leaf below `word`, run it and print the result.
pub fn handle_invoke(word: &str, matches: &ArgMatches, registry: &CommandRegistry) -> Result<()> {
    let mut words = vec![word];
    let mut leaf = matches;
    while let Some((next, sub_m)) = leaf.subcommand() {
        words.push(next);
        leaf = sub_m;
    }

    let command = registry.lookup(&words.join(" "))?;
    let output = invoke(command, collect_values(command, leaf))?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Gather parsed values for every parameter of `command`.
///
/// Parameters the user left out are declared without a value.
pub fn collect_values(command: &Command, matches: &ArgMatches) -> ArgValues {
    command
        .parameters()
        .iter()
        .fold(ArgValues::new(), |mut values, param| {
            let name = param.internal_name();
            match matches.try_get_one::<String>(name).ok().flatten() {
                Some(value) => values.set(name, value.clone()),
                None => values.declare(name),
            }
            values
        })
}

/// Validate, build the client and plan the call, routing failures through
/// the command's exception handler when it has one.
///
/// # Errors
///
/// Returns the validation or client error when no handler is attached, or
/// whatever the handler returns.
pub fn invoke(command: &Command, values: ArgValues) -> cmdtable_core::Result<Value> {
    dispatch_plan(command, values).or_else(|err| match command.exception_handler() {
        Some(handler) => {
            tracing::debug!(command = %command.name(), error = %err, "Routing error to exception handler");
            handler(err)
        }
        None => Err(err),
    })
}

/// Describe the call `command` would make with `values`.
///
/// Secrets are redacted from the echoed arguments.
///
/// # Errors
///
/// Returns the first validator rejection or client factory failure.
pub fn dispatch_plan(command: &Command, values: ArgValues) -> cmdtable_core::Result<Value> {
    let values = command.validate(values)?;
    let client = (command.client_factory())(&values)?;

    let arguments: Map<String, Value> = values
        .iter()
        .map(|(name, value)| {
            let shown = match value {
                None => Value::Null,
                Some(_) if SECRET_PARAMETERS.contains(&name) => Value::from(REDACTED),
                Some(value) => Value::from(value),
            };
            (name.to_string(), shown)
        })
        .collect();

    Ok(json!({
        "command": command.name(),
        "operation": command.operation(),
        "client": client,
        "arguments": arguments,
        "hooks": {
            "transform": command.transform().is_some(),
            "table_transformer": command.table_transformer().is_some(),
        },
    }))
}
