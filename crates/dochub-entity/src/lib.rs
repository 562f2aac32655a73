//! # dochub-entity
//!
//! Domain entity models for DocHub. Every struct in this crate represents
//! a database table row or a domain value object. Database rows derive
//! `sqlx::FromRow`.

pub mod association;
pub mod document;
