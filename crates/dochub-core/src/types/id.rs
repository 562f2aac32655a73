//! Identifiers used across DocHub.
//!
//! Version records are keyed by UUIDs generated in the application
//! (time-ordered v7, so ids of one chain sort by creation). Tenants, users
//! and CRM entities live in the host CRM and keep its integer keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant partition key, supplied by the authentication layer.
pub type TenantId = i64;

/// Identifier of a CRM user or of any external CRM entity.
pub type ExternalId = i64;

/// Unique identifier of one version record (one revision of a document).
///
/// The root record's id doubles as the identity of the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// A fresh, time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The inner UUID, for binding id lists as `UUID[]`.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(DocumentId::new(), DocumentId::new());
        assert_eq!(DocumentId::new().into_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_parses_its_display_form() {
        let uuid = Uuid::new_v4();
        let id: DocumentId = format!(" {uuid} ").parse().expect("should parse");
        assert_eq!(id.into_uuid(), uuid);
        assert_eq!(id.to_string(), uuid.to_string());
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }

    #[test]
    fn test_serializes_as_bare_uuid() {
        let id = DocumentId::from(Uuid::nil());
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
