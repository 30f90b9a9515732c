//! API version gating for command registration

use crate::version::{ApiVersion, ResourceType, VersionContext};

/// Availability window of a command for one resource type.
///
/// A gate without a resource type, or without any bound, is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionGate {
    pub resource_type: Option<ResourceType>,
    pub min_api: Option<ApiVersion>,
    pub max_api: Option<ApiVersion>,
}

impl VersionGate {
    /// A gate that admits every version.
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }

    /// Gate on `resource_type` with no bounds yet.
    #[must_use]
    pub const fn for_resource(resource_type: ResourceType) -> Self {
        Self {
            resource_type: Some(resource_type),
            min_api: None,
            max_api: None,
        }
    }

    #[must_use]
    pub const fn min_api(mut self, version: ApiVersion) -> Self {
        self.min_api = Some(version);
        self
    }

    #[must_use]
    pub const fn max_api(mut self, version: ApiVersion) -> Self {
        self.max_api = Some(version);
        self
    }

    /// Whether the gate has no effect regardless of the version context.
    #[must_use]
    pub const fn is_unconditional(&self) -> bool {
        self.resource_type.is_none() || (self.min_api.is_none() && self.max_api.is_none())
    }

    /// Evaluate the gate against the active version context.
    pub fn is_supported(&self, ctx: &dyn VersionContext) -> bool {
        is_supported(
            self.resource_type.as_ref(),
            self.min_api.as_ref(),
            self.max_api.as_ref(),
            ctx,
        )
    }
}

/// Decide whether a command gated on `resource_type` exists for `ctx`.
///
/// Fails closed: a resource type unknown to `ctx` yields `false` and a warning,
/// never an error, so one bad definition cannot abort startup.
pub fn is_supported(
    resource_type: Option<&ResourceType>,
    min_api: Option<&ApiVersion>,
    max_api: Option<&ApiVersion>,
    ctx: &dyn VersionContext,
) -> bool {
    let Some(resource_type) = resource_type else {
        return true;
    };
    if min_api.is_none() && max_api.is_none() {
        return true;
    }

    if ctx.api_version(resource_type).is_none() {
        tracing::warn!(%resource_type, "Unknown resource type in version gate, treating as unsupported");
        return false;
    }

    ctx.is_supported(resource_type, min_api, max_api)
}
