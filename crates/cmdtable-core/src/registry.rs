//! The command table
//!
//! Populated through `&mut CommandRegistry` during startup, then shared as
//! `Arc<CommandRegistry>` for read-only lookups.

use std::{collections::BTreeMap, sync::Arc};

use itertools::Itertools;

use crate::{Command, Error, Result};

/// Mapping from command name to built command. Last registration wins.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<Command>>,
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `command` under its name, returning the entry it replaced.
    pub fn register(&mut self, command: Command) -> Option<Arc<Command>> {
        let name = command.name().to_string();
        let previous = self.commands.insert(name.clone(), Arc::new(command));
        if previous.is_some() {
            tracing::debug!(command = %name, "Replaced existing command registration");
        } else {
            tracing::debug!(command = %name, "Registered command");
        }
        previous
    }

    /// Find a command by its full name.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no command is registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<&Arc<Command>> {
        self.commands
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("command '{name}'")))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Every command, ordered by name. Each call starts a fresh iteration.
    pub fn list_all(&self) -> impl Iterator<Item = &Arc<Command>> + '_ {
        self.commands.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.keys().map(String::as_str)
    }

    /// Commands whose name starts with the words of `prefix`.
    ///
    /// Matching is by whole words: `storage blob` matches `storage blob upload`
    /// but not `storage blobs list`.
    pub fn commands_under<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a Arc<Command>> + 'a {
        let prefix_words: Vec<String> = prefix.split_whitespace().map(str::to_string).collect();
        self.commands.values().filter(move |command| {
            let words: Vec<&str> = command.words().collect();
            words.len() >= prefix_words.len()
                && words.iter().zip(&prefix_words).all(|(word, expected)| word == expected)
        })
    }

    /// Distinct command groups, including intermediate ones, ordered by name.
    ///
    /// `storage blob upload` contributes `storage` and `storage blob`.
    #[must_use]
    pub fn groups(&self) -> Vec<String> {
        self.commands
            .values()
            .flat_map(|command| {
                let words: Vec<&str> = command.words().collect();
                (1..words.len())
                    .map(|depth| words[..depth].join(" "))
                    .collect::<Vec<_>>()
            })
            .sorted()
            .dedup()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Freeze the table for concurrent readers.
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
