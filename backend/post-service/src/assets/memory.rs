/// In-memory asset store for tests and local runs
use super::{asset_id_from_url, AssetStore, ImagePayload};
use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

pub struct InMemoryAssetStore {
    base_url: String,
    objects: Mutex<HashMap<String, ImagePayload>>,
    fail_destroy: AtomicBool,
}

impl Default for InMemoryAssetStore {
    fn default() -> Self {
        Self::new("https://assets.local/posts")
    }
}

impl InMemoryAssetStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: Mutex::new(HashMap::new()),
            fail_destroy: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `destroy` fail
    pub fn fail_destroys(&self, fail: bool) {
        self.fail_destroy.store(fail, Ordering::SeqCst);
    }

    pub async fn contains_url(&self, url: &str) -> bool {
        match asset_id_from_url(url) {
            Some(id) => self.objects.lock().await.contains_key(id),
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait::async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn upload(&self, image: &ImagePayload) -> Result<String> {
        let asset_id = Uuid::new_v4().simple().to_string();
        let url = format!("{}/{}.{}", self.base_url, asset_id, image.extension());
        self.objects.lock().await.insert(asset_id, image.clone());
        Ok(url)
    }

    async fn destroy(&self, asset_id: &str) -> Result<()> {
        if self.fail_destroy.load(Ordering::SeqCst) {
            return Err(AppError::Asset(format!(
                "destroy of {} rejected by store",
                asset_id
            )));
        }
        self.objects.lock().await.remove(asset_id);
        Ok(())
    }
}
