//! SRN (structured resource name) parsing
//!
//! An SRN type id has the form `srn:type:<type>:<version>` where the version
//! segment may be empty or absent. Parsing is a pure function: a string that
//! does not match the grammar can never become a valid identifier.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const SRN_TYPE_PREFIX: &str = "srn:type:";

/// SRN parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SrnError {
    #[error("Malformed SRN: {0}")]
    Malformed(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),
}

/// Closed set of resource types the gateway understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    WpWellLog,
    WpcWellLog,
    WpDocument,
    WpcDocument,
    WpWellboreMarker,
    WpcWellboreMarker,
    WpWellborePath,
    WpcWellborePath,
    WpWellboreTrajectory,
    WpcWellboreTrajectory,
    FileLas2,
    FileCsv,
    FilePdf,
    FilePath,
}

impl ResourceType {
    /// The `<type>` segment of an SRN for this resource type
    pub fn as_tag(&self) -> &'static str {
        match self {
            ResourceType::WpWellLog => "work-product/WellLog",
            ResourceType::WpcWellLog => "work-product-component/WellLog",
            ResourceType::WpDocument => "work-product/Document",
            ResourceType::WpcDocument => "work-product-component/Document",
            ResourceType::WpWellboreMarker => "work-product/WellboreMarker",
            ResourceType::WpcWellboreMarker => "work-product-component/WellboreMarker",
            ResourceType::WpWellborePath => "work-product/WellborePath",
            ResourceType::WpcWellborePath => "work-product-component/WellborePath",
            ResourceType::WpWellboreTrajectory => "work-product/WellboreTrajectory",
            ResourceType::WpcWellboreTrajectory => "work-product-component/WellboreTrajectory",
            ResourceType::FileLas2 => "file/las2",
            ResourceType::FileCsv => "file/csv",
            ResourceType::FilePdf => "file/pdf",
            ResourceType::FilePath => "file/path",
        }
    }

    /// Resolve a `<type>` segment to its enum constant
    pub fn from_tag(tag: &str) -> Result<Self, SrnError> {
        const ALL: [ResourceType; 14] = [
            ResourceType::WpWellLog,
            ResourceType::WpcWellLog,
            ResourceType::WpDocument,
            ResourceType::WpcDocument,
            ResourceType::WpWellboreMarker,
            ResourceType::WpcWellboreMarker,
            ResourceType::WpWellborePath,
            ResourceType::WpcWellborePath,
            ResourceType::WpWellboreTrajectory,
            ResourceType::WpcWellboreTrajectory,
            ResourceType::FileLas2,
            ResourceType::FileCsv,
            ResourceType::FilePdf,
            ResourceType::FilePath,
        ];

        ALL.iter()
            .find(|rt| rt.as_tag() == tag)
            .copied()
            .ok_or_else(|| SrnError::UnknownResourceType(tag.to_string()))
    }
}

/// A parsed, validated SRN type id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeId {
    raw: String,
    type_tag: String,
    version: Option<String>,
    resource_type: ResourceType,
}

impl ResourceTypeId {
    /// Parse `srn:type:<type>:<version>?`.
    ///
    /// Fails with `Malformed` when the string does not match the grammar and
    /// with `UnknownResourceType` when the `<type>` segment is not in the
    /// closed enumeration. Deterministic; no I/O.
    pub fn parse(raw: &str) -> Result<Self, SrnError> {
        let rest = raw
            .strip_prefix(SRN_TYPE_PREFIX)
            .ok_or_else(|| SrnError::Malformed(raw.to_string()))?;

        // The type segment never contains ':', so the last colon (if any)
        // separates type from version.
        let (type_tag, version) = match rest.rsplit_once(':') {
            Some((tag, ver)) => (tag, Some(ver)),
            None => (rest, None),
        };

        if type_tag.is_empty() {
            return Err(SrnError::Malformed(raw.to_string()));
        }

        let resource_type = ResourceType::from_tag(type_tag)?;

        Ok(Self {
            raw: raw.to_string(),
            type_tag: type_tag.to_string(),
            version: version
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.to_string()),
            resource_type,
        })
    }

    /// The original string this id was parsed from
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The `<type>` segment
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// The `<version>` segment, if present and non-blank
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// True iff the version segment is present and non-blank
    pub fn has_version(&self) -> bool {
        self.version.is_some()
    }
}

impl std::fmt::Display for ResourceTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for ResourceTypeId {
    type Err = SrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceTypeId::parse(s)
    }
}

/// Mint a fresh data SRN for a resource created under `type_id`.
///
/// Data SRNs always carry version 1; the uuid keeps successive ingestions of
/// equivalent files distinct.
pub fn generate_srn(type_id: &ResourceTypeId) -> String {
    format!("srn:{}:{}:1", type_id.type_tag(), Uuid::new_v4().simple())
}
