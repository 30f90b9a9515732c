//! Parameter descriptors and the argument namespace validators operate on

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Parsed argument values keyed by internal parameter name.
///
/// A key present with `None` is a declared parameter the user left unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArgValues(BTreeMap<String, Option<String>>);

impl ArgValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Value of `name`, if declared and set. Empty strings count as unset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Option::as_deref)
            .filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), Some(value.into()));
    }

    /// Declare `name` without a value, keeping any existing value.
    pub fn declare(&mut self, name: impl Into<String>) {
        self.0.entry(name.into()).or_insert(None);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }
}

/// Signature of an argument validator: takes the namespace, returns it
/// (possibly rewritten) or rejects it.
pub type ValidatorFn = dyn Fn(ArgValues) -> Result<ArgValues> + Send + Sync;

/// A named validator attached to a parameter.
///
/// The command table only stores validators; the argument parsing layer runs
/// them after parsing.
#[derive(Clone)]
pub struct Validator {
    name: String,
    func: Arc<ValidatorFn>,
}

impl Validator {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(ArgValues) -> Result<ArgValues> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the validator over `values`.
    ///
    /// # Errors
    ///
    /// Returns whatever the validator rejects the namespace with.
    pub fn run(&self, values: ArgValues) -> Result<ArgValues> {
        (self.func)(values)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.name).finish()
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Validator {}

impl Serialize for Validator {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// Declarative description of one command-line argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    internal_name: String,
    flag: String,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arg_group: Option<String>,
    help_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    validator: Option<Validator>,
}

impl ParameterDescriptor {
    /// Describe an optional parameter bound to `flag`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `internal_name` is not a snake_case
    /// identifier or `flag` is not a `--long-option`.
    pub fn new(internal_name: impl Into<String>, flag: impl Into<String>) -> Result<Self> {
        let internal_name = internal_name.into();
        let flag = flag.into();

        let valid_name = internal_name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
            && internal_name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid_name {
            return Err(Error::validation(
                "internal_name",
                format!("'{internal_name}' must be a snake_case identifier"),
            ));
        }

        let valid_flag = flag
            .strip_prefix("--")
            .is_some_and(|long| !long.is_empty() && !long.starts_with('-') && !long.contains(char::is_whitespace));
        if !valid_flag {
            return Err(Error::validation(
                "flag",
                format!("'{flag}' must be a long option such as --account-name"),
            ));
        }

        Ok(Self {
            internal_name,
            flag,
            required: false,
            default: None,
            arg_group: None,
            help_text: String::new(),
            validator: None,
        })
    }

    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn arg_group(mut self, group: impl Into<String>) -> Self {
        self.arg_group = Some(group.into());
        self
    }

    #[must_use]
    pub fn help(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = help_text.into();
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    /// The option flag including its leading dashes.
    #[must_use]
    pub fn flag(&self) -> &str {
        &self.flag
    }

    /// The option flag without its leading dashes.
    #[must_use]
    pub fn long_name(&self) -> &str {
        self.flag.trim_start_matches('-')
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.arg_group.as_deref()
    }

    #[must_use]
    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    #[must_use]
    pub const fn validator_ref(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn test_descriptor_defaults() -> Result<()> {
        let param = ParameterDescriptor::new("container_name", "--container-name")?;
        assert_eq!(param.internal_name(), "container_name");
        assert_eq!(param.long_name(), "container-name");
        assert!(!param.is_required());
        assert_eq!(param.default(), None);
        assert_eq!(param.group(), None);
        assert!(param.validator_ref().is_none());
        Ok(())
    }

    #[test]
    fn test_descriptor_rejects_bad_names() {
        assert!(ParameterDescriptor::new("", "--x").is_err());
        assert!(ParameterDescriptor::new("AccountName", "--account-name").is_err());
        assert!(ParameterDescriptor::new("account-name", "--account-name").is_err());
        assert!(ParameterDescriptor::new("_hidden", "--hidden").is_err());
    }

    #[test]
    fn test_descriptor_rejects_bad_flags() {
        assert!(ParameterDescriptor::new("name", "name").is_err());
        assert!(ParameterDescriptor::new("name", "-n").is_err());
        assert!(ParameterDescriptor::new("name", "--").is_err());
        assert!(ParameterDescriptor::new("name", "---name").is_err());
        assert!(ParameterDescriptor::new("name", "--my name").is_err());
    }

    #[test]
    fn test_arg_values_empty_string_is_unset() {
        let mut values = ArgValues::new().with("sas_token", "");
        assert!(!values.is_set("sas_token"));
        values.set("sas_token", "sv=2017");
        assert_eq!(values.get("sas_token"), Some("sv=2017"));
    }

    #[test]
    fn test_declare_keeps_existing_value() {
        let mut values = ArgValues::new().with("account_name", "acct");
        values.declare("account_name");
        values.declare("account_key");
        assert_eq!(values.get("account_name"), Some("acct"));
        assert_eq!(values.iter().count(), 2);
    }

    #[test]
    fn test_validator_runs_and_serializes_by_name() {
        let upper = Validator::new("upper", |mut values: ArgValues| {
            let name = values.get("name").map(str::to_uppercase);
            if let Some(name) = name {
                values.set("name", name);
            }
            Ok(values)
        });
        let out = upper.run(ArgValues::new().with("name", "blob")).expect("validator");
        assert_eq!(out.get("name"), Some("BLOB"));
        assert_eq!(serde_json::to_string(&upper).expect("serialize"), "\"upper\"");
    }
}
