//! API versions, resource types and API profiles
//!
//! An [`ApiProfile`] pins one service API version per [`ResourceType`]. It is
//! the version context consulted by [`crate::gate::VersionGate`] when deciding
//! whether a version-gated command exists in the current CLI session.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{Error, Result};

const PREVIEW_SUFFIX: &str = "-preview";

/// A dated service API version such as `2017-04-17` or `2016-05-31-preview`.
///
/// Versions order by date; for the same date a preview sorts before the
/// general availability release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion {
    date: NaiveDate,
    stable: bool,
}

impl ApiVersion {
    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidVersion` unless the input is `YYYY-MM-DD` naming a
    /// real calendar date, optionally followed by `-preview`.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let (date_part, stable) = trimmed
            .strip_suffix(PREVIEW_SUFFIX)
            .map_or((trimmed, true), |date| (date, false));

        if date_part.len() != 10 {
            return Err(Error::InvalidVersion(format!(
                "'{s}' is not of the form YYYY-MM-DD"
            )));
        }

        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|e| Error::InvalidVersion(format!("'{s}': {e}")))?;

        Ok(Self { date, stable })
    }

    /// Whether this is a preview release.
    #[must_use]
    pub const fn is_preview(&self) -> bool {
        !self.stable
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ApiVersion> for String {
    fn from(version: ApiVersion) -> Self {
        version.to_string()
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))?;
        if !self.stable {
            f.write_str(PREVIEW_SUFFIX)?;
        }
        Ok(())
    }
}

/// Opaque identifier of a versioned service surface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    /// Storage data plane (blobs, files, queues, tables).
    pub const DATA_STORAGE: &'static str = "data-storage";
    /// Storage account management.
    pub const MGMT_STORAGE: &'static str = "mgmt-storage";

    /// Create a resource type identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Storage data plane resource type.
    #[must_use]
    pub fn data_storage() -> Self {
        Self::new(Self::DATA_STORAGE)
    }

    /// Storage management resource type.
    #[must_use]
    pub fn mgmt_storage() -> Self {
        Self::new(Self::MGMT_STORAGE)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Source of the active API version per resource type.
///
/// Implementors only need [`VersionContext::api_version`]; the range check is
/// provided. A resource type the context does not know is never supported.
pub trait VersionContext {
    /// Active API version for `resource_type`, if the context knows it.
    fn api_version(&self, resource_type: &ResourceType) -> Option<ApiVersion>;

    /// Whether the active version of `resource_type` lies in `[min_api, max_api]`.
    ///
    /// Either bound may be absent, meaning unbounded on that side.
    fn is_supported(
        &self,
        resource_type: &ResourceType,
        min_api: Option<&ApiVersion>,
        max_api: Option<&ApiVersion>,
    ) -> bool {
        self.api_version(resource_type).is_some_and(|active| {
            min_api.map_or(true, |min| active >= *min) && max_api.map_or(true, |max| active <= *max)
        })
    }
}

/// Profiles shipped with the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter, IntoStaticStr)]
pub enum BuiltinProfile {
    #[strum(serialize = "latest")]
    Latest,
    #[strum(serialize = "2017-03-09-profile")]
    Profile20170309,
    #[strum(serialize = "2018-03-01-hybrid")]
    Hybrid20180301,
}

impl BuiltinProfile {
    /// Resource versions pinned by this profile.
    const fn pins(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Latest => &[
                (ResourceType::DATA_STORAGE, "2017-04-17"),
                (ResourceType::MGMT_STORAGE, "2017-06-01"),
            ],
            Self::Profile20170309 => &[
                (ResourceType::DATA_STORAGE, "2015-04-05"),
                (ResourceType::MGMT_STORAGE, "2016-01-01"),
            ],
            Self::Hybrid20180301 => &[
                (ResourceType::DATA_STORAGE, "2017-04-17"),
                (ResourceType::MGMT_STORAGE, "2016-01-01"),
            ],
        }
    }

    /// Names of every builtin profile.
    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::iter().map(<&'static str>::from)
    }
}

/// A named set of pinned API versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiProfile {
    name: String,
    versions: BTreeMap<ResourceType, ApiVersion>,
}

impl ApiProfile {
    /// Create an empty profile.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: BTreeMap::new(),
        }
    }

    /// Materialize a builtin profile.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidVersion` if a pinned version fails to parse.
    pub fn builtin(profile: BuiltinProfile) -> Result<Self> {
        profile
            .pins()
            .iter()
            .try_fold(Self::new(profile.to_string()), |acc, (resource, version)| -> Result<Self> {
                Ok(acc.with_override(ResourceType::new(*resource), ApiVersion::parse(version)?))
            })
    }

    /// Look up a builtin profile by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown profile name.
    pub fn from_name(name: &str) -> Result<Self> {
        let profile = BuiltinProfile::from_str(name).map_err(|_| {
            let known: Vec<&str> = BuiltinProfile::names().collect();
            Error::NotFound(format!(
                "API profile '{name}' (known profiles: {})",
                known.join(", ")
            ))
        })?;
        Self::builtin(profile)
    }

    /// Pin `resource_type` to `version`, replacing any existing pin.
    #[must_use]
    pub fn with_override(mut self, resource_type: ResourceType, version: ApiVersion) -> Self {
        self.versions.insert(resource_type, version);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pinned versions, ordered by resource type.
    pub fn versions(&self) -> impl Iterator<Item = (&ResourceType, &ApiVersion)> {
        self.versions.iter()
    }
}

impl VersionContext for ApiProfile {
    fn api_version(&self, resource_type: &ResourceType) -> Option<ApiVersion> {
        self.versions.get(resource_type).copied()
    }
}
