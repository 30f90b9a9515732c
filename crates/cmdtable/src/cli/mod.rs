pub mod handlers;

use clap::{Arg, ArgAction, Command};
use cmdtable_core::{CommandRegistry, ParameterDescriptor};
use itertools::Itertools;

pub fn build_cli(registry: &CommandRegistry) -> Command {
    Command::new("cmdtable")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Storage data-plane command table")
        .subcommand_required(true)
        .arg(
            Arg::new("profile")
                .long("profile")
                .global(true)
                .value_name("NAME")
                .help("API profile selecting service versions (e.g. latest, 2017-03-09-profile)"),
        )
        .subcommand(cmd_list())
        .subcommand(cmd_describe())
        .subcommands(subcommands_under(registry, &[]))
}

/// Profile named by `--profile` anywhere in `args`.
///
/// The command tree depends on the profile, so this is read before the tree
/// is built.
pub fn profile_from_args(args: &[String]) -> Option<String> {
    args.iter()
        .skip(1)
        .map(String::as_str)
        .take_while(|arg| *arg != "--")
        .chain([""])
        .tuple_windows()
        .find_map(|(arg, next)| {
            arg.strip_prefix("--profile=")
                .or_else(|| (arg == "--profile").then_some(next))
                .filter(|profile| !profile.is_empty())
                .map(str::to_string)
        })
}

fn cmd_list() -> Command {
    Command::new("list")
        .about("List registered commands as JSON lines")
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .value_name("WORDS")
                .help("Only list commands under this group (e.g. \"storage blob\")"),
        )
        .arg(
            Arg::new("skipped")
                .long("skipped")
                .action(ArgAction::SetTrue)
                .help("List commands left out by the active API profile instead"),
        )
}

fn cmd_describe() -> Command {
    Command::new("describe")
        .about("Describe one command and its parameters")
        .arg(
            Arg::new("name")
                .required(true)
                .num_args(1..)
                .value_name("WORDS")
                .help("Command name, e.g. storage blob upload"),
        )
}

/// Subcommands directly below the group named by `prefix`.
///
/// A name that is itself registered becomes a leaf; anything else becomes a
/// group holding the deeper levels.
fn subcommands_under<'a>(registry: &'a CommandRegistry, prefix: &[&'a str]) -> Vec<Command> {
    let depth = prefix.len();
    registry
        .commands_under(&prefix.join(" "))
        .filter_map(|command| command.words().nth(depth))
        .unique()
        .map(|word| {
            let path: Vec<&str> = prefix.iter().copied().chain([word]).collect();
            registry.lookup(&path.join(" ")).map_or_else(
                |_| {
                    Command::new(word.to_string())
                        .about(format!("Commands under '{}'", path.join(" ")))
                        .subcommand_required(true)
                        .subcommands(subcommands_under(registry, &path))
                },
                |command| {
                    Command::new(word.to_string())
                        .about(format!("Invoke {}", command.operation()))
                        .args(command.parameters().iter().map(parameter_arg))
                },
            )
        })
        .collect()
}

fn parameter_arg(param: &ParameterDescriptor) -> Arg {
    let arg = Arg::new(param.internal_name().to_string())
        .long(param.long_name().to_string())
        .help(param.help_text().to_string())
        .required(param.is_required() && param.default().is_none())
        .action(ArgAction::Set);
    let arg = match param.group() {
        Some(group) => arg.help_heading(group.to_string()),
        None => arg,
    };
    match param.default() {
        Some(default) => arg.default_value(default.to_string()),
        None => arg,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use cmdtable_core::{register_storage_commands, ApiProfile, BuiltinProfile};

    use super::*;

    fn registry(profile: BuiltinProfile) -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        let profile = ApiProfile::builtin(profile).expect("builtin profile");
        register_storage_commands(&mut registry, &profile).expect("catalog registers");
        registry
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_cli_tree_is_consistent() {
        build_cli(&registry(BuiltinProfile::Latest)).debug_assert();
    }

    #[test]
    fn test_leaf_parses_storage_parameters() {
        let cli = build_cli(&registry(BuiltinProfile::Latest));
        let matches = cli
            .try_get_matches_from([
                "cmdtable",
                "storage",
                "blob",
                "upload",
                "--container-name",
                "c",
                "--name",
                "b",
                "--file",
                "/tmp/x",
                "--account-name",
                "acct",
            ])
            .expect("parses");

        let (_, storage) = matches.subcommand().expect("storage");
        let (_, blob) = storage.subcommand().expect("blob");
        let (leaf, upload) = blob.subcommand().expect("upload");
        assert_eq!(leaf, "upload");
        assert_eq!(
            upload.get_one::<String>("account_name").map(String::as_str),
            Some("acct")
        );
    }

    #[test]
    fn test_required_parameter_enforced() {
        let cli = build_cli(&registry(BuiltinProfile::Latest));
        let result = cli.try_get_matches_from(["cmdtable", "storage", "queue", "create"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_gated_command_absent_from_tree() {
        let cli = build_cli(&registry(BuiltinProfile::Profile20170309));
        let result = cli.try_get_matches_from([
            "cmdtable",
            "storage",
            "blob",
            "set-tier",
            "--container-name",
            "c",
            "--name",
            "b",
            "--tier",
            "Hot",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_from_args_forms() {
        assert_eq!(
            profile_from_args(&args(&["cmdtable", "list", "--profile", "latest"])),
            Some("latest".to_string())
        );
        assert_eq!(
            profile_from_args(&args(&["cmdtable", "--profile=2018-03-01-hybrid", "list"])),
            Some("2018-03-01-hybrid".to_string())
        );
        assert_eq!(
            profile_from_args(&args(&["cmdtable", "list", "--profile=latest"])),
            Some("latest".to_string())
        );
        assert_eq!(profile_from_args(&args(&["cmdtable", "list"])), None);
        assert_eq!(profile_from_args(&args(&["cmdtable", "list", "--profile"])), None);
    }

    #[test]
    fn test_profile_from_args_stops_at_terminator() {
        assert_eq!(
            profile_from_args(&args(&["cmdtable", "describe", "--", "--profile=x"])),
            None
        );
        assert_eq!(
            profile_from_args(&args(&["cmdtable", "describe", "--", "--profile", "x"])),
            None
        );
        assert_eq!(
            profile_from_args(&args(&["cmdtable", "--profile=latest", "--", "--profile=x"])),
            Some("latest".to_string())
        );
    }
}
