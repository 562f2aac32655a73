//! # dochub-database
//!
//! PostgreSQL connection management, the version chain and association
//! repositories, and an in-memory store with the same semantics for
//! single-process use and tests.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{AssociationStore, LabelQuery, VersionStore};
