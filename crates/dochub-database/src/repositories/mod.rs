//! PostgreSQL implementations of the store traits.

pub mod association;
pub mod label;
pub mod version;

pub use association::AssociationRepository;
pub use label::LabelRepository;
pub use version::VersionRepository;
