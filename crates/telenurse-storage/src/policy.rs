use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::StorageError;
use crate::staging;

/// The interview policy text, kept in a single file.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    path: PathBuf,
}

impl PolicyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored text, or `None` if nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the stored text.
    ///
    /// The new text is staged under a unique temporary name and renamed
    /// over the old file, so concurrent saves never share a temp file and
    /// readers see either version in full.
    pub async fn save(&self, text: &str) -> Result<(), StorageError> {
        let dir = match self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                dir
            }
            None => Path::new("."),
        };
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "policy".to_string());

        let tmp_path = staging::stage(dir, &name, text.as_bytes()).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            staging::discard(&tmp_path).await;
            return Err(e.into());
        }

        info!(path = %self.path.display(), len = text.len(), "interview policy saved");
        Ok(())
    }
}
