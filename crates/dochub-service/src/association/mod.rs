//! Entity and tag associations, and label rendering.

pub mod label;
pub mod service;

pub use label::LabelResolver;
pub use service::{AssociationService, LinkedEntity};
