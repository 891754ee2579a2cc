/// Image asset storage
///
/// Post images arrive from the web client as `data:` URIs, are uploaded to an
/// object store, and are referenced from the post by their public URL. The
/// asset identifier is the URL's last path segment without its extension.
use crate::error::{AppError, Result};
use base64::Engine;

pub mod memory;
pub mod s3;

pub use memory::InMemoryAssetStore;
pub use s3::S3AssetStore;

#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist the image and return its durable public URL
    async fn upload(&self, image: &ImagePayload) -> Result<String>;

    /// Remove the asset with the given identifier
    async fn destroy(&self, asset_id: &str) -> Result<()>;
}

/// Decoded image upload
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Parse a `data:image/<type>;base64,<payload>` URI
    pub fn from_data_uri(raw: &str, max_bytes: usize) -> Result<Self> {
        let invalid = |msg: &str| AppError::InvalidArgument(msg.to_string());

        let rest = raw
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| invalid("Image must be a base64 data URI"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| invalid("Image must be a base64 data URI"))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| invalid("Image must be base64 encoded"))?;

        let content_type: mime::Mime = media_type
            .parse()
            .map_err(|_| invalid("Image has an invalid media type"))?;
        if content_type.type_() != mime::IMAGE {
            return Err(invalid("Only image uploads are supported"));
        }

        // Base64 inflates by 4/3; reject before decoding oversized payloads.
        if payload.len() / 4 * 3 > max_bytes + 3 {
            return Err(invalid("Image is too large"));
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|_| invalid("Image payload is not valid base64"))?;
        if bytes.is_empty() {
            return Err(invalid("Image payload is empty"));
        }
        if bytes.len() > max_bytes {
            return Err(invalid("Image is too large"));
        }

        Ok(Self {
            content_type,
            bytes,
        })
    }

    /// File extension for the stored object
    pub fn extension(&self) -> &str {
        match self.content_type.subtype().as_str() {
            "jpeg" => "jpg",
            other => other,
        }
    }
}

/// Asset identifier for a stored image URL: the last path segment, cut at the
/// first `.`. Query strings and fragments are ignored.
pub fn asset_id_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    let id = segment.split('.').next()?;
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
