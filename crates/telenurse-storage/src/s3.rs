use aws_sdk_s3::Client;
use tracing::info;

use telenurse_core::artifact::{self, ASSESSMENTS_PREFIX};
use telenurse_core::models::assessment::Assessment;

use crate::error::StorageError;
use crate::objects;
use crate::repository::{AssessmentRepository, BoxFuture};

/// Assessments stored as JSON objects under a key prefix of one bucket.
#[derive(Debug, Clone)]
pub struct S3Repository {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Repository {
    /// `prefix` defaults to `assessment_records/` when `None`.
    pub fn new(config: &aws_config::SdkConfig, bucket: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            client: Client::new(config),
            bucket: bucket.into(),
            prefix: prefix.unwrap_or_else(|| ASSESSMENTS_PREFIX.to_string()),
        }
    }

    async fn put(&self, assessment: &Assessment) -> Result<String, StorageError> {
        let name = artifact::assessment_name(&assessment.patient_id, assessment.timestamp);
        let key = artifact::assessment_key(&self.prefix, &name);
        let body = serde_json::to_vec_pretty(assessment)?;

        objects::put_object_if_absent(&self.client, &self.bucket, &key, body, Some("application/json")).await?;

        info!(bucket = %self.bucket, key = %key, "assessment saved");
        Ok(name)
    }

    async fn names(&self) -> Result<Vec<String>, StorageError> {
        let keys = objects::list_objects(&self.client, &self.bucket, &self.prefix).await?;
        let names = keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(self.prefix.as_str()).map(str::to_string));
        Ok(artifact::newest_first(names))
    }

    async fn load(&self, name: &str) -> Result<Assessment, StorageError> {
        let key = artifact::assessment_key(&self.prefix, name);
        if artifact::parse_assessment_name(name).is_none() {
            return Err(StorageError::NotFound { key });
        }
        let body = objects::get_object(&self.client, &self.bucket, &key).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl AssessmentRepository for S3Repository {
    fn save<'a>(&'a self, assessment: &'a Assessment) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(self.put(assessment))
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<String>, StorageError>> {
        Box::pin(self.names())
    }

    fn get<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Assessment, StorageError>> {
        Box::pin(self.load(name))
    }
}
