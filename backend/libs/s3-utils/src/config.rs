/// S3 configuration for the asset bucket
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Public base URL objects are served from (CDN or bucket endpoint)
    pub public_base_url: String,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack)
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Whether to use path-style addressing (required by most S3-compatible stores)
    pub path_style: bool,
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Self {
        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| "chirp-assets".to_string());
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let public_base_url = std::env::var("S3_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.{}.amazonaws.com", bucket, region));

        Self {
            bucket,
            region,
            public_base_url,
            endpoint_url: std::env::var("S3_ENDPOINT_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            path_style: std::env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Public URL an object key is served from
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}
