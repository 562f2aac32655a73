//! # dochub-service
//!
//! Business logic for document version chains. Each service orchestrates
//! the store traits from `dochub-database` and a byte storage provider.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references, so the same workflows run
//! against PostgreSQL or the in-memory store.

pub mod association;
pub mod context;
pub mod document;

pub use association::{AssociationService, LabelResolver, LinkedEntity};
pub use context::RequestContext;
pub use document::{UploadService, VersionService};
