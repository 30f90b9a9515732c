//! Storage data-plane command registration
//!
//! Every storage data-plane command carries the same four parameters for
//! building a storage client: account name, account key, connection string
//! and SAS token. [`register_storage_command`] injects them and commits the
//! command to the table, unless the command's version gate excludes it.

use std::collections::BTreeMap;

use crate::{
    command::{ClientFactory, ExceptionHandler, Transform},
    gate::VersionGate,
    param::{ArgValues, Validator},
    version::VersionContext,
    CommandBuilder, CommandRegistry, Error, OperationRef, ParameterDescriptor, Result,
};

/// Argument group the storage client parameters are displayed under.
pub const STORAGE_ACCOUNT_GROUP: &str = "Storage Account";

pub const ACCOUNT_NAME: &str = "account_name";
pub const ACCOUNT_KEY: &str = "account_key";
pub const CONNECTION_STRING: &str = "connection_string";
pub const SAS_TOKEN: &str = "sas_token";

pub const ENV_ACCOUNT: &str = "AZURE_STORAGE_ACCOUNT";
pub const ENV_KEY: &str = "AZURE_STORAGE_KEY";
pub const ENV_CONNECTION_STRING: &str = "AZURE_STORAGE_CONNECTION_STRING";
pub const ENV_SAS_TOKEN: &str = "AZURE_STORAGE_SAS_TOKEN";

/// Internal names of the injected parameters, in injection order.
pub const STORAGE_PARAMETERS: [&str; 4] = [ACCOUNT_NAME, ACCOUNT_KEY, CONNECTION_STRING, SAS_TOKEN];

/// Definition of one storage data-plane command, before gating.
pub struct StorageCommand {
    pub name: String,
    pub operation: OperationRef,
    pub client_factory: ClientFactory,
    pub transform: Option<Transform>,
    pub table_transformer: Option<Transform>,
    pub exception_handler: Option<ExceptionHandler>,
    pub gate: VersionGate,
    /// Command-specific parameters, added after the storage parameters.
    pub arguments: Vec<ParameterDescriptor>,
}

impl StorageCommand {
    pub fn new(name: impl Into<String>, operation: OperationRef, client_factory: ClientFactory) -> Self {
        Self {
            name: name.into(),
            operation,
            client_factory,
            transform: None,
            table_transformer: None,
            exception_handler: None,
            gate: VersionGate::open(),
            arguments: Vec::new(),
        }
    }

    #[must_use]
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    #[must_use]
    pub fn table_transformer(mut self, transformer: Transform) -> Self {
        self.table_transformer = Some(transformer);
        self
    }

    #[must_use]
    pub fn exception_handler(mut self, handler: ExceptionHandler) -> Self {
        self.exception_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn gate(mut self, gate: VersionGate) -> Self {
        self.gate = gate;
        self
    }

    #[must_use]
    pub fn argument(mut self, param: ParameterDescriptor) -> Self {
        self.arguments.push(param);
        self
    }
}

/// Register a storage data-plane command.
///
/// Returns `Ok(false)` without touching the registry when the version gate
/// excludes the command for `ctx`, `Ok(true)` once the command is registered
/// (replacing any command of the same name).
///
/// # Errors
///
/// Returns `Error::DuplicateArgument` / `Error::DuplicateFlag` if a
/// command-specific argument collides with another argument or with one of the
/// storage parameters. The registry is left unchanged.
pub fn register_storage_command(
    registry: &mut CommandRegistry,
    ctx: &dyn VersionContext,
    command: StorageCommand,
) -> Result<bool> {
    if !command.gate.is_supported(ctx) {
        tracing::debug!(command = %command.name, "Skipping command unsupported by active API profile");
        return Ok(false);
    }

    let mut builder = CommandBuilder::new(command.name, command.operation, command.client_factory)?
        .transform(command.transform)
        .table_transformer(command.table_transformer)
        .exception_handler(command.exception_handler);

    builder.add_arguments(storage_parameters()?)?;
    builder.add_arguments(command.arguments)?;

    registry.register(builder.build());
    Ok(true)
}

/// The four storage client parameters, in display order.
///
/// # Errors
///
/// Only fails if a built-in descriptor is malformed.
pub fn storage_parameters() -> Result<[ParameterDescriptor; 4]> {
    Ok([
        ParameterDescriptor::new(ACCOUNT_NAME, "--account-name")?
            .arg_group(STORAGE_ACCOUNT_GROUP)
            .help(format!(
                "Storage account name. Related environment variable: {ENV_ACCOUNT}. Must be used in \
                 conjunction with either storage account key or a SAS token. If neither are present, \
                 the command will try to query the storage account key using the authenticated \
                 account. If a large number of storage commands are executed the API quota may be hit"
            )),
        ParameterDescriptor::new(ACCOUNT_KEY, "--account-key")?
            .arg_group(STORAGE_ACCOUNT_GROUP)
            .help(format!(
                "Storage account key. Must be used in conjunction with storage account name. \
                 Environment variable: {ENV_KEY}"
            )),
        ParameterDescriptor::new(CONNECTION_STRING, "--connection-string")?
            .arg_group(STORAGE_ACCOUNT_GROUP)
            .validator(Validator::new("validate_client_parameters", validate_client_parameters))
            .help(format!(
                "Storage account connection string. Environment variable: {ENV_CONNECTION_STRING}"
            )),
        ParameterDescriptor::new(SAS_TOKEN, "--sas-token")?
            .arg_group(STORAGE_ACCOUNT_GROUP)
            .help(format!(
                "A Shared Access Signature (SAS). Must be used in conjunction with storage account \
                 name. Environment variable: {ENV_SAS_TOKEN}"
            )),
    ])
}

/// Resolve storage client parameters from flags and the process environment.
///
/// # Errors
///
/// See [`validate_client_parameters_with`].
pub fn validate_client_parameters(values: ArgValues) -> Result<ArgValues> {
    validate_client_parameters_with(values, |name| std::env::var(name).ok())
}

/// Resolve storage client parameters using `env` for environment fallbacks.
///
/// 1. Without an explicit account name or connection string, the connection
///    string falls back to `AZURE_STORAGE_CONNECTION_STRING`.
/// 2. A connection string supplies the account name, key and SAS token it
///    contains. Explicit `--account-name` / `--account-key` values must agree
///    with it.
/// 3. Remaining blanks fall back to `AZURE_STORAGE_ACCOUNT`,
///    `AZURE_STORAGE_KEY` and `AZURE_STORAGE_SAS_TOKEN`.
/// 4. A leading `?` is stripped from the SAS token.
/// 5. A key or SAS token without an account name is rejected.
///
/// # Errors
///
/// Returns `Error::Validation` on a malformed or conflicting connection string,
/// or on credentials without an account name.
pub fn validate_client_parameters_with<F>(mut values: ArgValues, env: F) -> Result<ArgValues>
where
    F: Fn(&str) -> Option<String>,
{
    if !values.is_set(CONNECTION_STRING) && !values.is_set(ACCOUNT_NAME) {
        if let Some(connection_string) = env(ENV_CONNECTION_STRING).filter(|s| !s.is_empty()) {
            values.set(CONNECTION_STRING, connection_string);
        }
    }

    if let Some(connection_string) = values.get(CONNECTION_STRING).map(str::to_owned) {
        apply_connection_string(&mut values, &connection_string)?;
    }

    for (name, var) in [(ACCOUNT_NAME, ENV_ACCOUNT), (ACCOUNT_KEY, ENV_KEY), (SAS_TOKEN, ENV_SAS_TOKEN)] {
        if !values.is_set(name) {
            if let Some(value) = env(var).filter(|s| !s.is_empty()) {
                values.set(name, value);
            }
        }
    }

    if let Some(stripped) = values
        .get(SAS_TOKEN)
        .and_then(|token| token.strip_prefix('?'))
        .map(str::to_owned)
    {
        values.set(SAS_TOKEN, stripped);
    }

    if !values.is_set(ACCOUNT_NAME) {
        if values.is_set(ACCOUNT_KEY) {
            return Err(Error::validation(
                ACCOUNT_KEY,
                "--account-key must be used in conjunction with --account-name",
            ));
        }
        if values.is_set(SAS_TOKEN) {
            return Err(Error::validation(
                SAS_TOKEN,
                "--sas-token must be used in conjunction with --account-name",
            ));
        }
    }

    for name in STORAGE_PARAMETERS {
        values.declare(name);
    }
    Ok(values)
}

fn apply_connection_string(values: &mut ArgValues, connection_string: &str) -> Result<()> {
    let pairs = parse_connection_string(connection_string)?;

    let account_name = pairs.get("AccountName").ok_or_else(|| {
        Error::validation(CONNECTION_STRING, "connection string is missing AccountName")
    })?;

    for (field, from_string) in [(ACCOUNT_NAME, Some(account_name)), (ACCOUNT_KEY, pairs.get("AccountKey"))] {
        let Some(from_string) = from_string else {
            continue;
        };
        let explicit = values.get(field).map(str::to_owned);
        match explicit {
            Some(explicit) if &explicit != from_string => {
                return Err(Error::validation(
                    field,
                    format!("--{} conflicts with the value in --connection-string", field.replace('_', "-")),
                ));
            }
            Some(_) => {}
            None => values.set(field, from_string.clone()),
        }
    }

    if let Some(sas) = pairs.get("SharedAccessSignature") {
        if !values.is_set(SAS_TOKEN) {
            values.set(SAS_TOKEN, sas.clone());
        }
    }

    Ok(())
}

/// Parse a `Key=Value;Key=Value` connection string.
///
/// Values may themselves contain `=` (base64 keys). Empty segments are ignored.
///
/// # Errors
///
/// Returns `Error::Validation` for a segment without `=` or with an empty key.
pub fn parse_connection_string(connection_string: &str) -> Result<BTreeMap<String, String>> {
    connection_string
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(Error::validation(
                CONNECTION_STRING,
                format!("malformed connection string segment '{segment}'"),
            )),
        })
        .collect()
}
