//! Configuration loading and management
//!
//! # Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config: ~/.config/cmdtable/config.toml
//! 3. Project config: .cmdtable/config.toml
//! 4. Environment variables: `CMDTABLE_*`
//! 5. CLI flags (`--profile`)
//!
//! # Example Config
//!
//! ```toml
//! profile = "2017-03-09-profile"
//!
//! [api_versions]
//! data-storage = "2016-05-31"
//! ```

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    version::{ApiProfile, ApiVersion, ResourceType},
    Error, Result,
};

const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576; // 1 MB

pub const ENV_PROFILE: &str = "CMDTABLE_PROFILE";
pub const ENV_API_VERSIONS: &str = "CMDTABLE_API_VERSIONS";

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION STRUCTURES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Name of the API profile selecting service versions.
    pub profile: String,
    /// Per-resource version pins applied on top of the profile.
    pub api_versions: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: "latest".to_string(),
            api_versions: BTreeMap::new(),
        }
    }
}

/// Partial configuration with `Option<T>` fields for explicit-key merge semantics.
///
/// Only keys present in a TOML file are `Some`, so a file that sets just
/// `profile` leaves version pins from lower layers in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub api_versions: Option<BTreeMap<String, String>>,
}

impl Config {
    /// Merge a partial config. Version pins merge per resource.
    pub fn merge_partial(&mut self, partial: PartialConfig) {
        if let Some(profile) = partial.profile {
            self.profile = profile;
        }
        if let Some(api_versions) = partial.api_versions {
            self.api_versions.extend(api_versions);
        }
    }

    /// Apply `CMDTABLE_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns error if `CMDTABLE_API_VERSIONS` is not `resource=version,...`
    pub fn apply_env_vars(&mut self) -> Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    fn apply_env_with<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // CMDTABLE_PROFILE
        if let Some(value) = env(ENV_PROFILE).filter(|v| !v.trim().is_empty()) {
            self.profile = value.trim().to_string();
        }

        // CMDTABLE_API_VERSIONS (comma-separated resource=version)
        if let Some(value) = env(ENV_API_VERSIONS) {
            for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (resource, version) = pair.split_once('=').ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "Invalid {ENV_API_VERSIONS} entry '{pair}': expected resource=version"
                    ))
                })?;
                self.api_versions
                    .insert(resource.trim().to_string(), version.trim().to_string());
            }
        }

        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if the profile is unknown or a version pin is malformed
    pub fn validate(&self) -> Result<()> {
        self.api_profile().map(|_| ())
    }

    /// Resolve the configured profile with version pins applied.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` for an unknown profile name
    /// - `Error::InvalidConfig` for an empty resource name or bad version
    pub fn api_profile(&self) -> Result<ApiProfile> {
        let base = ApiProfile::from_name(&self.profile)?;
        self.api_versions
            .iter()
            .try_fold(base, |profile, (resource, version)| -> Result<ApiProfile> {
                if resource.trim().is_empty() {
                    return Err(Error::InvalidConfig(
                        "api_versions contains an empty resource name".to_string(),
                    ));
                }
                let version = ApiVersion::parse(version).map_err(|e| {
                    Error::InvalidConfig(format!("api_versions.{resource}: {e}"))
                })?;
                Ok(profile.with_override(ResourceType::new(resource.trim()), version))
            })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// LOADING
// ═══════════════════════════════════════════════════════════════════════════

/// Load configuration from all sources with proper precedence.
///
/// `cli_profile` is the `--profile` flag, the last layer.
///
/// # Errors
///
/// Returns error if:
/// - A config file exists but cannot be read
/// - A config file is malformed TOML or has unknown keys
/// - Config values fail validation
pub async fn load_config(cli_profile: Option<String>) -> Result<Config> {
    let global = global_config_path().ok();
    let project = project_config_path().ok();
    load_config_from(global.as_deref(), project.as_deref(), cli_profile).await
}

/// Load configuration from explicit file locations.
///
/// Missing files are skipped silently. Values are validated once, after
/// every layer is applied.
///
/// # Errors
///
/// Same as [`load_config`].
pub async fn load_config_from(
    global: Option<&Path>,
    project: Option<&Path>,
    cli_profile: Option<String>,
) -> Result<Config> {
    let mut config = Config::default();

    for path in [global, project].into_iter().flatten() {
        match load_partial_toml_file(path).await {
            Ok(partial) => config.merge_partial(partial),
            Err(Error::NotFound(_)) => {
                tracing::debug!(path = %path.display(), "Config file not found, skipping");
            }
            Err(e) => return Err(e),
        }
    }

    config.apply_env_vars()?;
    if let Some(profile) = cli_profile {
        config.profile = profile;
    }
    config.validate()?;

    Ok(config)
}

/// Get path to project config file
fn project_config_path() -> Result<PathBuf> {
    std::env::current_dir()
        .map(|dir| dir.join(".cmdtable/config.toml"))
        .map_err(|e| Error::IoError(format!("Failed to get current directory: {e}")))
}

/// Get path to global config file
fn global_config_path() -> Result<PathBuf> {
    directories::ProjectDirs::from("", "", "cmdtable")
        .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
        .ok_or_else(|| Error::IoError("Failed to determine global config directory".to_string()))
}

/// Load a TOML file into a `PartialConfig`.
///
/// # Errors
///
/// Returns error if:
/// - File does not exist (`Error::NotFound`)
/// - File exists but cannot be read (`Error::IoError`)
/// - File is a symlink or exceeds 1 MB (`Error::InvalidConfig`)
/// - TOML is malformed or has unknown keys (`Error::ParseError`)
pub async fn load_partial_toml_file(path: &Path) -> Result<PartialConfig> {
    let metadata = tokio::fs::symlink_metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("config file {}", path.display()))
        } else {
            Error::IoError(format!(
                "Failed to read config file metadata {}: {e}",
                path.display()
            ))
        }
    })?;

    if metadata.is_symlink() {
        return Err(Error::InvalidConfig(format!(
            "Config file {} is a symbolic link - refusing to follow",
            path.display()
        )));
    }

    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(Error::InvalidConfig(format!(
            "Config file {} exceeds maximum size of {MAX_CONFIG_FILE_SIZE} bytes",
            path.display()
        )));
    }

    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::IoError(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    toml::from_str(&content)
        .map_err(|e| Error::ParseError(format!("Failed to parse config: {}: {e}", path.display())))
}
