use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::config::StorageConfig;
use crate::credentials;

/// Client for the S3-compatible object storage HTTP API
///
/// Forwards uploaded bytes as-is and hands back the public download URL.
/// The service key is read from the environment per request.
pub struct StorageClient {
    base_url: String,
    bucket: String,
    client: reqwest::Client,
}

impl StorageClient {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Upload an object and return its public download URL
    pub async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let key = credentials::storage_service_key()?;
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", key))
            .header(CONTENT_TYPE, content_type.to_string())
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("Storage upload failed: {}", response.status()).into());
        }

        Ok(self.public_url(path))
    }

    /// Public download URL for an object in the configured bucket
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}
