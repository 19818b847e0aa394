//! Local directory backend.
//!
//! Each assessment is one pretty-printed JSON file. A save writes a hidden
//! temporary file, syncs it, then hard-links it to the final name. The link
//! fails if the name is taken, so an artifact is never replaced, and readers
//! only ever see complete files.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::info;

use telenurse_core::artifact;
use telenurse_core::models::assessment::Assessment;

use crate::error::StorageError;
use crate::repository::{AssessmentRepository, BoxFuture};
use crate::staging;

#[derive(Debug, Clone)]
pub struct FileRepository {
    dir: PathBuf,
}

impl FileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn write(&self, assessment: &Assessment) -> Result<String, StorageError> {
        let name = artifact::assessment_name(&assessment.patient_id, assessment.timestamp);
        let body = serde_json::to_vec_pretty(assessment)?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let final_path = self.dir.join(&name);
        let tmp_path = staging::stage(&self.dir, &name, &body).await?;

        let linked = tokio::fs::hard_link(&tmp_path, &final_path).await;
        staging::discard(&tmp_path).await;

        match linked {
            Ok(()) => {
                info!(path = %final_path.display(), "assessment saved");
                Ok(name)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StorageError::Conflict { key: name }),
            Err(e) => Err(e.into()),
        }
    }

    async fn names(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(artifact::newest_first(names))
    }

    async fn read(&self, name: &str) -> Result<Assessment, StorageError> {
        let not_found = || StorageError::NotFound {
            key: name.to_string(),
        };
        if artifact::parse_assessment_name(name).is_none() {
            return Err(not_found());
        }
        let body = match tokio::fs::read(self.dir.join(name)).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&body)?)
    }
}

impl AssessmentRepository for FileRepository {
    fn save<'a>(&'a self, assessment: &'a Assessment) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(self.write(assessment))
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<String>, StorageError>> {
        Box::pin(self.names())
    }

    fn get<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Assessment, StorageError>> {
        Box::pin(self.read(name))
    }
}
