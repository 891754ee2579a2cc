/// Shared S3 utilities
///
/// Provides the AWS S3 client wrapper, configuration, and the object
/// operations services use for user-uploaded assets.
use aws_sdk_s3::Client;
use std::sync::Arc;

pub mod config;
pub mod operations;

pub use config::S3Config;
pub use operations::{S3Error, S3Operations};

/// Shared S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Client {
    /// Create a client for `config`, resolving credentials from the default AWS chain
    pub async fn connect(config: S3Config) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint_url {
            tracing::info!(%endpoint, "using custom S3 endpoint");
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Arc::new(Client::from_conf(builder.build())),
            config,
        }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Object operations bound to the configured bucket
    pub fn operations(&self) -> S3Operations {
        S3Operations::new(self.client.clone(), self.config.clone())
    }
}
