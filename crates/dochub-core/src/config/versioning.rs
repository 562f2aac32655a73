//! `[versioning]` section.

use serde::{Deserialize, Serialize};

/// Behavior of the version creation workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Copy the entity and tag associations of the chain's current version
    /// onto each newly created version. When `false`, associations stay
    /// with the revision they were linked to.
    pub inherit_associations: bool,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            inherit_associations: true,
        }
    }
}
