/// S3 object operations used by the asset store
use crate::config::S3Config;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum S3Error {
    #[error("S3 {operation} failed for {key}: {message}")]
    Request {
        operation: &'static str,
        key: String,
        message: String,
    },
}

fn request_error<E: std::error::Error + 'static>(operation: &'static str, key: &str, err: E) -> S3Error {
    S3Error::Request {
        operation,
        key: key.to_string(),
        message: DisplayErrorContext(&err).to_string(),
    }
}

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Operations {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Upload an object and return its public URL
    pub async fn upload_file(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, S3Error> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| request_error("put_object", key, e))?;

        Ok(self.config.public_url(key))
    }

    /// Delete an object. Deleting a missing key is not an error.
    pub async fn delete_file(&self, key: &str) -> Result<(), S3Error> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| request_error("delete_object", key, e))?;

        Ok(())
    }

    /// List object keys under a prefix
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, S3Error> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| request_error("list_objects_v2", prefix, e))?;

        Ok(response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(|k| k.to_string()))
            .collect())
    }
}
