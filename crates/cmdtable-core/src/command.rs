//! Built commands and the builder that assembles them
//!
//! A [`Command`] binds a space-separated name (`storage blob upload`) to an
//! operation reference, a client factory and an ordered list of parameters.
//! The callables are stored as given; nothing in this crate invokes them.

use std::{fmt, sync::Arc};

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{param::ArgValues, Error, ParameterDescriptor, Result};

/// Builds the service client for a command from its validated arguments.
pub type ClientFactory = Arc<dyn Fn(&ArgValues) -> Result<Value> + Send + Sync>;

/// Rewrites a command's result before output.
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Turns a failed invocation into a result or a different error.
pub type ExceptionHandler = Arc<dyn Fn(Error) -> Result<Value> + Send + Sync>;

/// Path of the operation a command runs, in `module#Type.method` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OperationRef(String);

impl OperationRef {
    /// Parse an operation path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` unless the path is `module#member` with both
    /// sides non-empty.
    pub fn parse(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        match path.split_once('#') {
            Some((module, member))
                if !module.is_empty() && !member.is_empty() && !member.contains('#') =>
            {
                Ok(Self(path))
            }
            _ => Err(Error::validation(
                "operation",
                format!("'{path}' is not of the form module#Type.method"),
            )),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The module half of the path.
    #[must_use]
    pub fn module(&self) -> &str {
        self.0.split_once('#').map_or("", |(module, _)| module)
    }

    /// The member half of the path.
    #[must_use]
    pub fn member(&self) -> &str {
        self.0.split_once('#').map_or("", |(_, member)| member)
    }
}

impl fmt::Display for OperationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully built command.
#[derive(Clone)]
pub struct Command {
    name: String,
    operation: OperationRef,
    client_factory: ClientFactory,
    transform: Option<Transform>,
    table_transformer: Option<Transform>,
    exception_handler: Option<ExceptionHandler>,
    parameters: Vec<ParameterDescriptor>,
}

impl Command {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn operation(&self) -> &OperationRef {
        &self.operation
    }

    #[must_use]
    pub const fn client_factory(&self) -> &ClientFactory {
        &self.client_factory
    }

    #[must_use]
    pub const fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    #[must_use]
    pub const fn table_transformer(&self) -> Option<&Transform> {
        self.table_transformer.as_ref()
    }

    #[must_use]
    pub const fn exception_handler(&self) -> Option<&ExceptionHandler> {
        self.exception_handler.as_ref()
    }

    /// Parameters in insertion order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    #[must_use]
    pub fn parameter(&self, internal_name: &str) -> Option<&ParameterDescriptor> {
        self.parameters
            .iter()
            .find(|param| param.internal_name() == internal_name)
    }

    /// Name split into words (`["storage", "blob", "upload"]`).
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.name.split_whitespace()
    }

    /// Everything but the last word, or `""` for a top-level command.
    #[must_use]
    pub fn group(&self) -> &str {
        self.name.rsplit_once(' ').map_or("", |(group, _)| group)
    }

    /// Run every attached validator in parameter order.
    ///
    /// Each validator is run once even if several parameters carry it.
    ///
    /// # Errors
    ///
    /// Returns the first validator rejection.
    pub fn validate(&self, values: ArgValues) -> Result<ArgValues> {
        let mut seen: Vec<&str> = Vec::new();
        self.parameters
            .iter()
            .filter_map(ParameterDescriptor::validator_ref)
            .filter(|validator| {
                if seen.contains(&validator.name()) {
                    false
                } else {
                    seen.push(validator.name());
                    true
                }
            })
            .try_fold(values, |acc, validator| validator.run(acc))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("operation", &self.operation)
            .field("transform", &self.transform.is_some())
            .field("table_transformer", &self.table_transformer.is_some())
            .field("exception_handler", &self.exception_handler.is_some())
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Command", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("operation", &self.operation)?;
        state.serialize_field("transform", &self.transform.is_some())?;
        state.serialize_field("parameters", &self.parameters)?;
        state.end()
    }
}

/// Accumulates parameters onto a command before it is registered.
///
/// Building has no side effect; only
/// [`CommandRegistry::register`](crate::CommandRegistry::register) publishes
/// the result.
pub struct CommandBuilder {
    command: Command,
}

impl CommandBuilder {
    /// Start a command bound to `operation` and `client_factory`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `name` has no words.
    pub fn new(
        name: impl Into<String>,
        operation: OperationRef,
        client_factory: ClientFactory,
    ) -> Result<Self> {
        let name = name.into();
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Err(Error::validation("name", "command name cannot be empty"));
        }

        Ok(Self {
            command: Command {
                name: normalized,
                operation,
                client_factory,
                transform: None,
                table_transformer: None,
                exception_handler: None,
                parameters: Vec::new(),
            },
        })
    }

    #[must_use]
    pub fn transform(mut self, transform: Option<Transform>) -> Self {
        self.command.transform = transform;
        self
    }

    #[must_use]
    pub fn table_transformer(mut self, transformer: Option<Transform>) -> Self {
        self.command.table_transformer = transformer;
        self
    }

    #[must_use]
    pub fn exception_handler(mut self, handler: Option<ExceptionHandler>) -> Self {
        self.command.exception_handler = handler;
        self
    }

    /// Append a parameter.
    ///
    /// # Errors
    ///
    /// - `Error::DuplicateArgument` if the internal name is already present
    /// - `Error::DuplicateFlag` if another parameter binds the same flag
    pub fn add_argument(&mut self, param: ParameterDescriptor) -> Result<()> {
        let existing = &self.command.parameters;
        if existing
            .iter()
            .any(|p| p.internal_name() == param.internal_name())
        {
            return Err(Error::DuplicateArgument {
                command: self.command.name.clone(),
                name: param.internal_name().to_string(),
            });
        }
        if existing.iter().any(|p| p.flag() == param.flag()) {
            return Err(Error::DuplicateFlag {
                command: self.command.name.clone(),
                flag: param.flag().to_string(),
            });
        }

        self.command.parameters.push(param);
        Ok(())
    }

    /// Append several parameters, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Same as [`CommandBuilder::add_argument`].
    pub fn add_arguments(
        &mut self,
        params: impl IntoIterator<Item = ParameterDescriptor>,
    ) -> Result<()> {
        params
            .into_iter()
            .try_for_each(|param| self.add_argument(param))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.command.name
    }

    #[must_use]
    pub fn build(self) -> Command {
        self.command
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::param::Validator;

    fn factory() -> ClientFactory {
        Arc::new(|_: &ArgValues| Ok(Value::Null))
    }

    fn op() -> OperationRef {
        OperationRef::parse("storage.blob#BlockBlobService.create_blob_from_path")
            .expect("valid operation")
    }

    fn param(name: &str) -> ParameterDescriptor {
        let flag = format!("--{}", name.replace('_', "-"));
        ParameterDescriptor::new(name, flag).expect("valid parameter")
    }

    #[test]
    fn test_operation_ref_parts() {
        let op = op();
        assert_eq!(op.module(), "storage.blob");
        assert_eq!(op.member(), "BlockBlobService.create_blob_from_path");
    }

    #[test]
    fn test_operation_ref_rejects_malformed() {
        assert!(OperationRef::parse("no_separator").is_err());
        assert!(OperationRef::parse("#method").is_err());
        assert!(OperationRef::parse("module#").is_err());
        assert!(OperationRef::parse("a#b#c").is_err());
    }

    #[test]
    fn test_name_is_normalized() -> Result<()> {
        let builder = CommandBuilder::new("  storage   blob upload ", op(), factory())?;
        let command = builder.build();
        assert_eq!(command.name(), "storage blob upload");
        assert_eq!(command.group(), "storage blob");
        assert_eq!(command.words().count(), 3);
        Ok(())
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(CommandBuilder::new("   ", op(), factory()).is_err());
    }

    #[test]
    fn test_parameters_keep_insertion_order() -> Result<()> {
        let mut builder = CommandBuilder::new("storage blob upload", op(), factory())?;
        builder.add_arguments([param("file_path"), param("container_name"), param("blob_name")])?;
        let command = builder.build();
        let names: Vec<&str> = command
            .parameters()
            .iter()
            .map(ParameterDescriptor::internal_name)
            .collect();
        assert_eq!(names, ["file_path", "container_name", "blob_name"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_internal_name_rejected() -> Result<()> {
        let mut builder = CommandBuilder::new("storage blob upload", op(), factory())?;
        builder.add_argument(param("account_name"))?;
        let other_flag = ParameterDescriptor::new("account_name", "--name")?;
        let err = builder.add_argument(other_flag).expect_err("duplicate");
        assert_eq!(
            err,
            Error::DuplicateArgument {
                command: "storage blob upload".to_string(),
                name: "account_name".to_string(),
            }
        );
        assert_eq!(builder.build().parameters().len(), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_flag_rejected() -> Result<()> {
        let mut builder = CommandBuilder::new("storage blob upload", op(), factory())?;
        builder.add_argument(ParameterDescriptor::new("name", "--name")?)?;
        let err = builder
            .add_argument(ParameterDescriptor::new("blob_name", "--name")?)
            .expect_err("duplicate flag");
        assert!(matches!(err, Error::DuplicateFlag { .. }));
        Ok(())
    }

    #[test]
    fn test_validate_runs_shared_validator_once() -> Result<()> {
        let counting = Validator::new("count", |mut values: ArgValues| {
            let next = values
                .get("runs")
                .and_then(|runs| runs.parse::<u32>().ok())
                .map_or(1, |runs| runs + 1);
            values.set("runs", next.to_string());
            Ok(values)
        });
        let mut builder = CommandBuilder::new("storage queue create", op(), factory())?;
        builder.add_argument(param("queue_name").validator(counting.clone()))?;
        builder.add_argument(param("metadata").validator(counting))?;
        let out = builder.build().validate(ArgValues::new())?;
        assert_eq!(out.get("runs"), Some("1"));
        Ok(())
    }

    #[test]
    fn test_validate_stops_at_first_rejection() -> Result<()> {
        let reject = Validator::new("reject", |_: ArgValues| {
            Err(Error::validation("queue_name", "bad queue name"))
        });
        let mut builder = CommandBuilder::new("storage queue create", op(), factory())?;
        builder.add_argument(param("queue_name").validator(reject))?;
        let err = builder.build().validate(ArgValues::new()).expect_err("rejected");
        assert!(matches!(err, Error::Validation { .. }));
        Ok(())
    }

    #[test]
    fn test_serialize_command_summary() -> Result<()> {
        let mut builder = CommandBuilder::new("storage queue create", op(), factory())?;
        builder.add_argument(param("queue_name").required(true))?;
        let json = serde_json::to_value(builder.build()).expect("serialize");
        assert_eq!(json["name"], "storage queue create");
        assert_eq!(json["parameters"][0]["internal_name"], "queue_name");
        assert_eq!(json["parameters"][0]["required"], true);
        Ok(())
    }
}
