use std::path::{Component, Path, PathBuf};

use docreq_shared::RequestId;
use tokio::fs;
use tracing::{debug, info};

use crate::error::ServerError;

/// Verify that a resolved path stays within the expected base directory.
/// Prevents path traversal attacks.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, ServerError> {
    // Canonicalize base; target may not exist yet so normalize manually
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let mut resolved = canonical_base.clone();
    for component in target
        .strip_prefix(base)
        .unwrap_or(target)
        .components()
    {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::ParentDir => {
                return Err(ServerError::BadRequest(
                    "Path traversal detected".to_string(),
                ));
            }
            _ => {} // RootDir, CurDir, Prefix
        }
    }
    if !resolved.starts_with(&canonical_base) {
        return Err(ServerError::BadRequest(
            "Path traversal detected".to_string(),
        ));
    }
    Ok(resolved)
}

/// Key-addressed attachment storage: one file per request id under
/// `<base>/attachments/`. Puts overwrite; nothing here deletes.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    base_path: PathBuf,
    max_size: usize,
}

impl AttachmentStore {
    pub async fn new(root: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        let base_path = root.join("attachments");
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::BlobStorage(format!(
                "Failed to create attachment directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Attachment store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Store `data` under `id` and return its BLAKE3 hash (hex). The hash is
    /// for logs and callers; nothing re-reads the file to check it.
    pub async fn put(&self, id: &RequestId, data: &[u8]) -> Result<String, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BlobStorage("Empty attachment".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::AttachmentTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let path = self.safe_path(id)?;

        fs::write(&path, data).await.map_err(|e| {
            ServerError::BlobStorage(format!("Failed to write attachment {}: {}", id, e))
        })?;

        let hash = blake3::hash(data).to_hex().to_string();
        debug!(id = %id, size = data.len(), blake3 = %hash, "Stored attachment");
        Ok(hash)
    }

    pub async fn get(&self, id: &RequestId) -> Result<Vec<u8>, ServerError> {
        if !self.exists(id).await? {
            return Err(ServerError::AttachmentNotFound(id.clone()));
        }
        let path = self.safe_path(id)?;

        let data = fs::read(&path).await.map_err(|e| {
            ServerError::BlobStorage(format!("Failed to read attachment {}: {}", id, e))
        })?;

        debug!(id = %id, size = data.len(), "Retrieved attachment");
        Ok(data)
    }

    pub async fn exists(&self, id: &RequestId) -> Result<bool, ServerError> {
        let path = self.safe_path(id)?;
        fs::try_exists(&path).await.map_err(|e| {
            ServerError::BlobStorage(format!("Failed to stat attachment {}: {}", id, e))
        })
    }

    fn safe_path(&self, id: &RequestId) -> Result<PathBuf, ServerError> {
        let raw = self.base_path.join(id.as_str());
        ensure_within(&self.base_path, &raw)
    }
}
