//! Filesystem-backed [`StorageProvider`].
//!
//! Object keys are relative paths below a root directory. Keys that are
//! empty or could leave the root are rejected before touching the disk.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use dochub_core::error::{AppError, ErrorKind};
use dochub_core::result::AppResult;
use dochub_core::traits::StorageProvider;

/// Stores each object as one file under `root`.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    root: PathBuf,
    base_url: String,
}

fn io_failure(action: &str, path: &str, err: io::Error) -> AppError {
    if err.kind() == io::ErrorKind::NotFound {
        return AppError::not_found(format!("No stored object at '{path}'"));
    }
    AppError::with_source(ErrorKind::Storage, format!("Failed to {action} '{path}'"), err)
}

impl LocalStorageProvider {
    /// Opens (and if needed creates) the root directory.
    pub async fn new(root: &str, base_url: &str) -> AppResult<Self> {
        let root = PathBuf::from(root);
        fs::create_dir_all(&root)
            .await
            .map_err(|e| io_failure("create storage root", &root.to_string_lossy(), e))?;
        Ok(Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        let mut components = relative.components().peekable();
        if components.peek().is_none()
            || components.any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(AppError::validation(format!("Invalid storage path: '{key}'")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root).await.is_ok_and(|m| m.is_dir()))
    }

    async fn upload(&self, path: &str, data: Bytes) -> AppResult<u64> {
        let target = self.resolve(path)?;
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| io_failure("create directory for", path, e))?;
        }
        fs::write(&target, &data)
            .await
            .map_err(|e| io_failure("write", path, e))?;

        debug!(path, bytes = data.len(), "Stored document content");
        Ok(data.len() as u64)
    }

    async fn download(&self, path: &str) -> AppResult<Bytes> {
        let target = self.resolve(path)?;
        let data = fs::read(&target)
            .await
            .map_err(|e| io_failure("read", path, e))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => {
                debug!(path, "Deleted document content");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_failure("delete", path, e)),
        }
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let target = self.resolve(path)?;
        fs::try_exists(&target)
            .await
            .map_err(|e| io_failure("stat", path, e))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
