//! # dochub-core
//!
//! Core crate for DocHub, the document version control subsystem of the
//! CRM. Contains the storage collaborator trait, configuration schemas,
//! typed identifiers, pagination types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other DocHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
