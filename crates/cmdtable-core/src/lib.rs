//! Cmdtable-core - Command table and storage command registration
//!
//! This crate provides:
//! - Version gating against an API profile
//! - Parameter descriptors and validators
//! - The command builder and command registry
//! - Storage data-plane command registration and the storage catalog
//! - Layered configuration

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod gate;
pub mod param;
pub mod registry;
pub mod storage;
pub mod version;

pub use catalog::{register_storage_commands, CatalogReport, StorageService};
pub use command::{ClientFactory, Command, CommandBuilder, ExceptionHandler, OperationRef, Transform};
pub use config::Config;
pub use error::{Error, Result};
pub use gate::VersionGate;
pub use param::{ArgValues, ParameterDescriptor, Validator};
pub use registry::CommandRegistry;
pub use storage::{register_storage_command, StorageCommand};
pub use version::{ApiProfile, ApiVersion, BuiltinProfile, ResourceType, VersionContext};
