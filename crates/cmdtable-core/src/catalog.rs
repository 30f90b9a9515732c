//! The storage data-plane command catalog
//!
//! Declares every storage data-plane command the CLI ships and registers them
//! through [`register_storage_command`], so each one gets the storage account
//! parameters and its version gate.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use strum::Display;

use crate::{
    command::{ClientFactory, Transform},
    gate::VersionGate,
    param::ArgValues,
    storage::{register_storage_command, StorageCommand, ACCOUNT_KEY, ACCOUNT_NAME, SAS_TOKEN},
    version::{ApiVersion, ResourceType, VersionContext},
    CommandRegistry, Error, OperationRef, ParameterDescriptor, Result,
};

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Storage service a command's client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum StorageService {
    Blob,
    File,
    Queue,
    Table,
}

/// Client factory for `service`.
///
/// Produces a JSON description of the client the operation would be called
/// on: service, account, endpoint and the credential kind in use.
#[must_use]
pub fn storage_client_factory(service: StorageService) -> ClientFactory {
    Arc::new(move |values: &ArgValues| {
        let account = values.get(ACCOUNT_NAME).ok_or_else(|| {
            Error::validation(
                ACCOUNT_NAME,
                "Missing storage account name. Provide --account-name, --connection-string or \
                 set AZURE_STORAGE_ACCOUNT",
            )
        })?;

        let credential = if values.is_set(SAS_TOKEN) {
            "sas"
        } else if values.is_set(ACCOUNT_KEY) {
            "shared-key"
        } else {
            "anonymous"
        };

        Ok(json!({
            "service": service.to_string(),
            "account_name": account,
            "endpoint": format!("https://{account}.{service}.{DEFAULT_ENDPOINT_SUFFIX}"),
            "credential": credential,
        }))
    })
}

/// Unwrap a paged list result into its items.
#[must_use]
pub fn transform_list_output() -> Transform {
    Arc::new(|value: Value| match value {
        Value::Object(mut map) if map.get("items").is_some_and(Value::is_array) => {
            map.remove("items").unwrap_or(Value::Null)
        }
        other => other,
    })
}

/// Project list items onto a fixed set of columns for table output.
#[must_use]
pub fn transform_table_output(columns: &'static [&'static str]) -> Transform {
    Arc::new(move |value: Value| match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| {
                    let row: serde_json::Map<String, Value> = columns
                        .iter()
                        .map(|column| {
                            let cell = item.get(*column).cloned().unwrap_or(Value::Null);
                            ((*column).to_string(), cell)
                        })
                        .collect();
                    Value::Object(row)
                })
                .collect(),
        ),
        other => other,
    })
}

struct ArgSpec {
    name: &'static str,
    flag: &'static str,
    required: bool,
    help: &'static str,
}

const fn required(name: &'static str, flag: &'static str, help: &'static str) -> ArgSpec {
    ArgSpec { name, flag, required: true, help }
}

const fn optional(name: &'static str, flag: &'static str, help: &'static str) -> ArgSpec {
    ArgSpec { name, flag, required: false, help }
}

struct Entry {
    name: &'static str,
    operation: &'static str,
    service: StorageService,
    args: &'static [ArgSpec],
    min_api: Option<&'static str>,
    max_api: Option<&'static str>,
    columns: Option<&'static [&'static str]>,
}

const CONTAINER: ArgSpec = required("container_name", "--container-name", "The container name.");
const BLOB: ArgSpec = required("blob_name", "--name", "The blob name.");
const SHARE: ArgSpec = required("share_name", "--share-name", "The file share name.");
const NAME_COLUMNS: &[&str] = &["name", "last_modified"];

const CATALOG: &[Entry] = &[
    Entry {
        name: "storage blob list",
        operation: "storage.blob.baseblobservice#BaseBlobService.list_blobs",
        service: StorageService::Blob,
        args: &[CONTAINER, optional("prefix", "--prefix", "Filter the results to return only blobs whose names begin with the specified prefix.")],
        min_api: None,
        max_api: None,
        columns: Some(&["name", "blob_type", "content_length", "last_modified"]),
    },
    Entry {
        name: "storage blob upload",
        operation: "storage.blob.blockblobservice#BlockBlobService.create_blob_from_path",
        service: StorageService::Blob,
        args: &[CONTAINER, BLOB, required("file_path", "--file", "Path of the file to upload as the blob content.")],
        min_api: None,
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage blob download",
        operation: "storage.blob.baseblobservice#BaseBlobService.get_blob_to_path",
        service: StorageService::Blob,
        args: &[CONTAINER, BLOB, required("file_path", "--file", "Path of file to write out to.")],
        min_api: None,
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage blob delete",
        operation: "storage.blob.baseblobservice#BaseBlobService.delete_blob",
        service: StorageService::Blob,
        args: &[CONTAINER, BLOB],
        min_api: None,
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage blob exists",
        operation: "storage.blob.baseblobservice#BaseBlobService.exists",
        service: StorageService::Blob,
        args: &[CONTAINER, BLOB],
        min_api: None,
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage blob set-tier",
        operation: "storage.blob.blockblobservice#BlockBlobService.set_standard_blob_tier",
        service: StorageService::Blob,
        args: &[CONTAINER, BLOB, required("tier", "--tier", "The tier value to set the blob to.")],
        min_api: Some("2017-04-17"),
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage blob incremental-copy start",
        operation: "storage.blob.pageblobservice#PageBlobService.incremental_copy_blob",
        service: StorageService::Blob,
        args: &[
            required("destination_container", "--destination-container", "The container name of the copy destination."),
            required("destination_blob", "--destination-blob", "The blob name of the copy destination."),
            required("copy_source", "--source-uri", "A URL of up to 2 KB that specifies an Azure page blob snapshot."),
        ],
        min_api: Some("2016-05-31"),
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage container create",
        operation: "storage.blob.baseblobservice#BaseBlobService.create_container",
        service: StorageService::Blob,
        args: &[required("container_name", "--name", "The container name."), optional("public_access", "--public-access", "Specifies whether data in the container may be accessed publicly.")],
        min_api: None,
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage container list",
        operation: "storage.blob.baseblobservice#BaseBlobService.list_containers",
        service: StorageService::Blob,
        args: &[optional("prefix", "--prefix", "Filter the results to return only containers whose names begin with the specified prefix.")],
        min_api: None,
        max_api: None,
        columns: Some(NAME_COLUMNS),
    },
    Entry {
        name: "storage container delete",
        operation: "storage.blob.baseblobservice#BaseBlobService.delete_container",
        service: StorageService::Blob,
        args: &[required("container_name", "--name", "The container name.")],
        min_api: None,
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage share create",
        operation: "storage.file.fileservice#FileService.create_share",
        service: StorageService::File,
        args: &[required("share_name", "--name", "The file share name."), optional("quota", "--quota", "The maximum size of the share in gigabytes.")],
        min_api: None,
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage share list",
        operation: "storage.file.fileservice#FileService.list_shares",
        service: StorageService::File,
        args: &[optional("prefix", "--prefix", "Filter the results to return only shares whose names begin with the specified prefix.")],
        min_api: None,
        max_api: None,
        columns: Some(NAME_COLUMNS),
    },
    Entry {
        name: "storage file upload",
        operation: "storage.file.fileservice#FileService.create_file_from_path",
        service: StorageService::File,
        args: &[SHARE, required("local_file_path", "--source", "Path of the local file to upload as the file content."), optional("path", "--path", "The path to the file within the file share.")],
        min_api: None,
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage file list",
        operation: "storage.file.fileservice#FileService.list_directories_and_files",
        service: StorageService::File,
        args: &[SHARE, optional("directory_name", "--path", "The directory path within the file share.")],
        min_api: None,
        max_api: None,
        columns: Some(NAME_COLUMNS),
    },
    Entry {
        name: "storage queue create",
        operation: "storage.queue.queueservice#QueueService.create_queue",
        service: StorageService::Queue,
        args: &[required("queue_name", "--name", "The queue name.")],
        min_api: None,
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage queue list",
        operation: "storage.queue.queueservice#QueueService.list_queues",
        service: StorageService::Queue,
        args: &[optional("prefix", "--prefix", "Filter the results to return only queues whose names begin with the specified prefix.")],
        min_api: None,
        max_api: None,
        columns: Some(&["name"]),
    },
    Entry {
        name: "storage queue delete",
        operation: "storage.queue.queueservice#QueueService.delete_queue",
        service: StorageService::Queue,
        args: &[required("queue_name", "--name", "The queue name.")],
        min_api: None,
        max_api: None,
        columns: None,
    },
    Entry {
        name: "storage table create",
        operation: "storage.table.tableservice#TableService.create_table",
        service: StorageService::Table,
        args: &[required("table_name", "--name", "The table name.")],
        min_api: None,
        max_api: Some("2017-04-17"),
        columns: None,
    },
    Entry {
        name: "storage table list",
        operation: "storage.table.tableservice#TableService.list_tables",
        service: StorageService::Table,
        args: &[],
        min_api: None,
        max_api: Some("2017-04-17"),
        columns: Some(&["name"]),
    },
    Entry {
        name: "storage account generate-sas",
        operation: "storage.cloudstorageaccount#CloudStorageAccount.generate_shared_access_signature",
        service: StorageService::Blob,
        args: &[
            required("services", "--services", "The storage services the SAS is applicable for: (b)lob (f)ile (q)ueue (t)able."),
            required("resource_types", "--resource-types", "The resource types the SAS is applicable for: (s)ervice (c)ontainer (o)bject."),
            required("permission", "--permissions", "The permissions the SAS grants."),
            required("expiry", "--expiry", "Specifies the UTC datetime at which the SAS becomes invalid."),
        ],
        min_api: Some("2015-04-05"),
        max_api: None,
        columns: None,
    },
];

/// Outcome of registering the catalog against one version context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogReport {
    pub registered: Vec<String>,
    pub skipped: Vec<String>,
}

impl Entry {
    fn to_command(&self) -> Result<StorageCommand> {
        let mut gate = VersionGate::for_resource(ResourceType::data_storage());
        if let Some(min) = self.min_api {
            gate = gate.min_api(ApiVersion::parse(min)?);
        }
        if let Some(max) = self.max_api {
            gate = gate.max_api(ApiVersion::parse(max)?);
        }

        let mut command = StorageCommand::new(
            self.name,
            OperationRef::parse(self.operation)?,
            storage_client_factory(self.service),
        )
        .gate(gate);

        if let Some(columns) = self.columns {
            command = command
                .transform(transform_list_output())
                .table_transformer(transform_table_output(columns));
        }

        self.args.iter().try_fold(command, |command, spec| -> Result<StorageCommand> {
            Ok(command.argument(
                ParameterDescriptor::new(spec.name, spec.flag)?
                    .required(spec.required)
                    .help(spec.help),
            ))
        })
    }
}

/// Register every catalog command supported by `ctx`.
///
/// # Errors
///
/// Fails on the first malformed catalog entry.
pub fn register_storage_commands(
    registry: &mut CommandRegistry,
    ctx: &dyn VersionContext,
) -> Result<CatalogReport> {
    CATALOG.iter().try_fold(CatalogReport::default(), |mut report, entry| -> Result<CatalogReport> {
        if register_storage_command(registry, ctx, entry.to_command()?)? {
            report.registered.push(entry.name.to_string());
        } else {
            report.skipped.push(entry.name.to_string());
        }
        Ok(report)
    })
}
