/// S3-backed asset store
use super::{AssetStore, ImagePayload};
use crate::error::Result;
use s3_utils::S3Operations;
use uuid::Uuid;

pub struct S3AssetStore {
    ops: S3Operations,
    key_prefix: String,
}

impl S3AssetStore {
    pub fn new(ops: S3Operations, key_prefix: &str) -> Self {
        Self {
            ops,
            key_prefix: key_prefix.trim_matches('/').to_string(),
        }
    }

    fn object_key(&self, asset_id: &str, extension: &str) -> String {
        format!("{}/{}.{}", self.key_prefix, asset_id, extension)
    }
}

#[async_trait::async_trait]
impl AssetStore for S3AssetStore {
    async fn upload(&self, image: &ImagePayload) -> Result<String> {
        let asset_id = Uuid::new_v4().simple().to_string();
        let key = self.object_key(&asset_id, image.extension());

        let url = self
            .ops
            .upload_file(&key, image.bytes.clone(), image.content_type.as_ref())
            .await?;

        tracing::debug!(%key, size = image.bytes.len(), "uploaded post image");
        Ok(url)
    }

    async fn destroy(&self, asset_id: &str) -> Result<()> {
        // The identifier carries no extension; find the object(s) it names.
        let prefix = format!("{}/{}.", self.key_prefix, asset_id);
        let keys = self.ops.list_objects(&prefix).await?;
        if keys.is_empty() {
            tracing::debug!(%asset_id, "no stored object for asset");
        }

        for key in keys {
            self.ops.delete_file(&key).await?;
            tracing::debug!(%key, "deleted post image");
        }
        Ok(())
    }
}
