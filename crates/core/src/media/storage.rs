//! Local filesystem storage for uploaded files.
//!
//! Files live under `<root>/uploads/<YYYY>/<MM>/` and are addressed by their
//! storage path relative to `root`.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use chrono::{Datelike, Utc};
use tracing::debug;
use uuid::Uuid;

use super::rules::extension;
use crate::error::{CoreError, CoreResult};

const UPLOADS_DIR: &str = "uploads";

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

/// Keep alphanumerics, `-` and `_`, at most 50 characters.
fn safe_stem(filename: &str) -> String {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    };
    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(50)
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh, collision-free storage path for `filename`.
    pub fn new_storage_path(&self, filename: &str) -> String {
        let now = Utc::now();
        let unique = Uuid::new_v4().simple().to_string();
        let name = match extension(filename) {
            Some(ext) => format!("{}_{}.{ext}", safe_stem(filename), &unique[..12]),
            None => format!("{}_{}", safe_stem(filename), &unique[..12]),
        };
        format!("{UPLOADS_DIR}/{:04}/{:02}/{name}", now.year(), now.month())
    }

    /// Storage path of the thumbnail belonging to `storage_path`.
    pub fn thumbnail_path(storage_path: &str) -> String {
        let (dir, file) = storage_path.rsplit_once('/').unwrap_or(("", storage_path));
        let thumb = match file.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{stem}_thumb.{ext}"),
            _ => format!("{file}_thumb"),
        };
        if dir.is_empty() {
            thumb
        } else {
            format!("{dir}/{thumb}")
        }
    }

    pub fn url_for(&self, storage_path: &str) -> String {
        format!("{}/api/v1/media/files/{storage_path}", self.base_url)
    }

    /// Resolve a storage path, refusing anything that escapes the root.
    pub fn full_path(&self, storage_path: &str) -> CoreResult<PathBuf> {
        let rel = Path::new(storage_path);
        let safe = !storage_path.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(CoreError::BadRequest(format!(
                "invalid storage path '{storage_path}'"
            )));
        }
        Ok(self.root.join(rel))
    }

    pub async fn save(&self, storage_path: &str, data: &[u8]) -> CoreResult<()> {
        let path = self.full_path(storage_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if let Err(err) = tokio::fs::write(&path, data).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(err.into());
        }
        debug!(storage_path, bytes = data.len(), "stored file");
        Ok(())
    }

    pub async fn read(&self, storage_path: &str) -> CoreResult<Option<Bytes>> {
        let path = self.full_path(storage_path)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn exists(&self, storage_path: &str) -> CoreResult<bool> {
        let path = self.full_path(storage_path)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Remove a file and prune its month/year directories once empty.
    /// Returns false when the file did not exist.
    pub async fn delete(&self, storage_path: &str) -> CoreResult<bool> {
        let path = self.full_path(storage_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err.into()),
        }
        let mut dir = path.parent();
        for _ in 0..2 {
            match dir {
                Some(d) if d != self.root && tokio::fs::remove_dir(d).await.is_ok() => {
                    dir = d.parent();
                }
                _ => break,
            }
        }
        debug!(storage_path, "deleted file");
        Ok(true)
    }
}
