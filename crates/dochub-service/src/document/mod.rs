//! Document services: version chain workflows and byte uploads.

pub mod upload;
pub mod version;

pub use upload::{RevisionUpload, UploadParams, UploadService};
pub use version::VersionService;
