use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use telenurse_core::models::assessment::Assessment;

use crate::error::StorageError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Durable store of finished assessments.
///
/// Artifacts are write-once: `save` never replaces an existing artifact and
/// readers never observe a partially written one.
pub trait AssessmentRepository: Send + Sync {
    /// Persist `assessment` and return its artifact name.
    fn save<'a>(&'a self, assessment: &'a Assessment) -> BoxFuture<'a, Result<String, StorageError>>;

    /// Artifact names, newest first.
    fn list(&self) -> BoxFuture<'_, Result<Vec<String>, StorageError>>;

    /// Load an artifact by name. Unknown or malformed names are `NotFound`.
    fn get<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Assessment, StorageError>>;
}

impl<R: AssessmentRepository + ?Sized> AssessmentRepository for Arc<R> {
    fn save<'a>(&'a self, assessment: &'a Assessment) -> BoxFuture<'a, Result<String, StorageError>> {
        (**self).save(assessment)
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<String>, StorageError>> {
        (**self).list()
    }

    fn get<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Assessment, StorageError>> {
        (**self).get(name)
    }
}
