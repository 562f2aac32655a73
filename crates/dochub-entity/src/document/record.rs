//! Version record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use dochub_core::error::AppError;
use dochub_core::types::{DocumentId, ExternalId, TenantId};

use super::chain::resolve_root;

/// One revision of a logical document.
///
/// The record with `parent_id = None` is the chain root (version 1). Every
/// later revision points at the root, never at its predecessor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VersionRecord {
    /// Unique record identifier.
    pub id: DocumentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// CRM user who uploaded this revision.
    pub owner_id: ExternalId,
    /// Original filename.
    pub filename: String,
    /// MIME type of the content.
    pub content_type: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Position in the chain, starting at 1.
    pub version_number: i32,
    /// Whether this is the chain's active revision.
    pub is_current: bool,
    /// Chain root, `None` on the root itself.
    pub parent_id: Option<DocumentId>,
    /// When this revision was created.
    pub created_at: DateTime<Utc>,
    /// When this revision was last modified.
    pub updated_at: DateTime<Utc>,
}

impl VersionRecord {
    /// Identity of the chain this record belongs to.
    pub fn root_id(&self) -> DocumentId {
        resolve_root(self)
    }

    /// Whether this record is the chain root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether the record is visible to the given tenant.
    pub fn belongs_to(&self, tenant_id: TenantId) -> bool {
        self.tenant_id == tenant_id
    }
}

/// Fully resolved data for inserting a version record and its content
/// location.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewVersionRecord {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Uploading user.
    pub owner_id: ExternalId,
    /// Original filename.
    #[validate(
        length(min = 1, max = 255),
        custom(function = "validate_filename")
    )]
    pub filename: String,
    /// MIME type.
    #[validate(custom(function = "validate_content_type"))]
    pub content_type: String,
    /// Free-text description.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Path of the stored bytes.
    #[validate(length(min = 1))]
    pub storage_path: String,
    /// Size of the stored bytes.
    #[validate(range(min = 0))]
    pub byte_size: i64,
}

impl NewVersionRecord {
    /// Build the insert data for a new revision of `parent`'s chain.
    ///
    /// Filename and description carry over from the parent unless the
    /// request overrides them.
    pub fn from_parent(parent: &VersionRecord, request: &CreateVersion) -> Self {
        Self {
            tenant_id: parent.tenant_id,
            owner_id: request.owner_id,
            filename: request
                .filename
                .clone()
                .unwrap_or_else(|| parent.filename.clone()),
            content_type: request.content_type.clone(),
            description: request
                .description
                .clone()
                .or_else(|| parent.description.clone()),
            storage_path: request.storage_path.clone(),
            byte_size: request.byte_size,
        }
    }

    /// Run field validation, mapping failures into [`AppError`].
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::validation(format!("Invalid version record: {e}")))
    }
}

/// Request to start a new document chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateDocument {
    /// Uploading user.
    pub owner_id: ExternalId,
    /// Original filename.
    #[validate(
        length(min = 1, max = 255),
        custom(function = "validate_filename")
    )]
    pub filename: String,
    /// MIME type.
    #[validate(custom(function = "validate_content_type"))]
    pub content_type: String,
    /// Free-text description.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Path of the stored bytes.
    #[validate(length(min = 1))]
    pub storage_path: String,
    /// Size of the stored bytes.
    #[validate(range(min = 0))]
    pub byte_size: i64,
}

impl CreateDocument {
    /// Insert data for the chain root, owned by `tenant_id`.
    pub fn into_record(self, tenant_id: TenantId) -> NewVersionRecord {
        NewVersionRecord {
            tenant_id,
            owner_id: self.owner_id,
            filename: self.filename,
            content_type: self.content_type,
            description: self.description,
            storage_path: self.storage_path,
            byte_size: self.byte_size,
        }
    }

    /// Run field validation, mapping failures into [`AppError`].
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::validation(format!("Invalid document request: {e}")))
    }
}

/// Request to add a revision to an existing chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateVersion {
    /// Uploading user.
    pub owner_id: ExternalId,
    /// MIME type of the new content.
    #[validate(custom(function = "validate_content_type"))]
    pub content_type: String,
    /// Path of the stored bytes.
    #[validate(length(min = 1))]
    pub storage_path: String,
    /// Size of the stored bytes.
    #[validate(range(min = 0))]
    pub byte_size: i64,
    /// Filename override; defaults to the parent's.
    #[validate(
        length(min = 1, max = 255),
        custom(function = "validate_filename")
    )]
    pub filename: Option<String>,
    /// Description override; defaults to the parent's.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

impl CreateVersion {
    /// Run field validation, mapping failures into [`AppError`].
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::validation(format!("Invalid version request: {e}")))
    }
}

/// Filenames are a single path component with no control characters.
fn validate_filename(filename: &str) -> Result<(), ValidationError> {
    let bad = filename.trim().is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\'])
        || filename.chars().any(char::is_control);
    if bad {
        return Err(ValidationError::new("filename"));
    }
    Ok(())
}

/// Accepts `type/subtype` with an optional `; parameter` suffix.
fn validate_content_type(content_type: &str) -> Result<(), ValidationError> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    let valid_token = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    match essence.split_once('/') {
        Some((kind, subtype)) if valid_token(kind) && valid_token(subtype) => Ok(()),
        _ => Err(ValidationError::new("content_type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent() -> VersionRecord {
        let now = Utc::now();
        VersionRecord {
            id: DocumentId::new(),
            tenant_id: 7,
            owner_id: 3,
            filename: "resume.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            description: Some("Spring applications".to_string()),
            version_number: 1,
            is_current: true,
            parent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn request() -> CreateVersion {
        CreateVersion {
            owner_id: 4,
            content_type: "application/pdf".to_string(),
            storage_path: "7/abc/resume.pdf".to_string(),
            byte_size: 1024,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_parent_inherits_metadata() {
        let parent = parent();
        let data = NewVersionRecord::from_parent(&parent, &request());
        assert_eq!(data.tenant_id, 7);
        assert_eq!(data.owner_id, 4);
        assert_eq!(data.filename, "resume.pdf");
        assert_eq!(data.description.as_deref(), Some("Spring applications"));
    }

    #[test]
    fn test_from_parent_honors_overrides() {
        let parent = parent();
        let request = CreateVersion {
            filename: Some("resume-v2.pdf".to_string()),
            description: Some("Fall applications".to_string()),
            ..request()
        };
        let data = NewVersionRecord::from_parent(&parent, &request);
        assert_eq!(data.filename, "resume-v2.pdf");
        assert_eq!(data.description.as_deref(), Some("Fall applications"));
    }

    #[test]
    fn test_rejects_path_in_filename() {
        let request = CreateVersion {
            filename: Some("../etc/passwd".to_string()),
            ..request()
        };
        assert!(request.check().is_err());
    }

    #[test]
    fn test_content_type_validation() {
        assert!(validate_content_type("application/pdf").is_ok());
        assert!(validate_content_type("text/plain; charset=utf-8").is_ok());
        assert!(
            validate_content_type(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            )
            .is_ok()
        );
        assert!(validate_content_type("pdf").is_err());
        assert!(validate_content_type("application/").is_err());
        assert!(validate_content_type("").is_err());
    }

    #[test]
    fn test_create_document_into_record() {
        let request = CreateDocument {
            owner_id: 3,
            filename: "offer.docx".to_string(),
            content_type: "application/msword".to_string(),
            description: None,
            storage_path: "7/x/offer.docx".to_string(),
            byte_size: 10,
        };
        assert!(request.check().is_ok());
        let data = request.into_record(7);
        assert_eq!(data.tenant_id, 7);
        assert_eq!(data.filename, "offer.docx");
        assert!(data.check().is_ok());
    }

    #[test]
    fn test_create_document_rejects_negative_size() {
        let request = CreateDocument {
            owner_id: 3,
            filename: "offer.docx".to_string(),
            content_type: "application/msword".to_string(),
            storage_path: "7/x/offer.docx".to_string(),
            byte_size: -1,
            ..Default::default()
        };
        assert!(request.check().is_err());
    }
}
