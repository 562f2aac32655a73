//! # dochub-storage
//!
//! Byte storage for document content. Version records only hold a
//! storage path and size; the bytes live behind a
//! [`StorageProvider`](dochub_core::traits::StorageProvider).

pub mod mime;
pub mod providers;

pub use mime::guess_content_type;
pub use providers::LocalStorageProvider;
