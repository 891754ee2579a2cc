/// Post service - creation, deletion, likes, comments, and feed queries
use crate::assets::{asset_id_from_url, AssetStore, ImagePayload};
use crate::db::{PostFilter, PostStore};
use crate::error::{AppError, Result};
use crate::metrics::{record_operation, ASSET_CLEANUP_TOTAL};
use crate::models::{NewPost, NotificationType, Post, PostView, User};
use crate::services::authorization::ensure_post_owner;
use crate::services::feed;
use crate::services::notifications::NotificationService;
use std::sync::Arc;
use uuid::Uuid;

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// Trimmed, non-empty text or nothing
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Count the outcome and log failures under the operation's name
fn observe<T>(op: &'static str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => record_operation(op, "ok"),
        Err(err) => {
            record_operation(op, err.kind());
            if err.kind() == "internal" {
                tracing::error!(op, error = %err, "post operation failed");
            } else {
                tracing::debug!(op, error = %err, "post operation rejected");
            }
        }
    }
    result
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
    assets: Arc<dyn AssetStore>,
    notifications: NotificationService,
    max_image_bytes: usize,
}

impl PostService {
    pub fn new(
        store: Arc<dyn PostStore>,
        assets: Arc<dyn AssetStore>,
        notifications: NotificationService,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            store,
            assets,
            notifications,
            max_image_bytes,
        }
    }

    async fn require_user(&self, id: Uuid) -> Result<User> {
        self.store.find_user(id).await?.ok_or_else(user_not_found)
    }

    async fn require_post(&self, id: Uuid) -> Result<Post> {
        self.store.find_post(id).await?.ok_or_else(post_not_found)
    }

    /// Create a post with text, an image, or both
    pub async fn create_post(
        &self,
        actor: Uuid,
        text: Option<&str>,
        image: Option<&str>,
    ) -> Result<PostView> {
        observe("create", self.create_post_inner(actor, text, image).await)
    }

    async fn create_post_inner(
        &self,
        actor: Uuid,
        text: Option<&str>,
        image: Option<&str>,
    ) -> Result<PostView> {
        self.require_user(actor).await?;

        let text = non_blank(text);
        let image = non_blank(image);
        if text.is_none() && image.is_none() {
            return Err(AppError::InvalidArgument(
                "Post must have text or image".to_string(),
            ));
        }

        // Validate the payload before anything is uploaded.
        let image_url = match image {
            Some(raw) => {
                let payload = ImagePayload::from_data_uri(raw, self.max_image_bytes)?;
                Some(self.assets.upload(&payload).await?)
            }
            None => None,
        };

        let post = self
            .store
            .insert_post(NewPost {
                author_id: actor,
                text: text.map(str::to_string),
                image: image_url,
            })
            .await?;

        tracing::info!(post_id = %post.id, %actor, has_image = post.image.is_some(), "post created");
        feed::compose_one(self.store.as_ref(), post).await
    }

    /// Delete a post owned by `actor`, then clean up its image.
    ///
    /// Image cleanup is best-effort: the post is already gone when it runs,
    /// and a failure is logged and counted rather than returned.
    pub async fn delete_post(&self, actor: Uuid, post_id: Uuid) -> Result<()> {
        observe("delete", self.delete_post_inner(actor, post_id).await)
    }

    async fn delete_post_inner(&self, actor: Uuid, post_id: Uuid) -> Result<()> {
        let post = self.require_post(post_id).await?;
        ensure_post_owner(actor, &post)?;

        if !self.store.delete_post(post_id).await? {
            // Raced with another delete by the same owner.
            return Err(post_not_found());
        }
        tracing::info!(%post_id, %actor, "post deleted");

        if let Some(url) = post.image.as_deref() {
            self.cleanup_image(post_id, url).await;
        }
        Ok(())
    }

    async fn cleanup_image(&self, post_id: Uuid, url: &str) {
        let Some(asset_id) = asset_id_from_url(url) else {
            tracing::warn!(%post_id, %url, "cannot derive asset id from image url");
            ASSET_CLEANUP_TOTAL.with_label_values(&["skipped"]).inc();
            return;
        };

        match self.assets.destroy(asset_id).await {
            Ok(()) => {
                ASSET_CLEANUP_TOTAL.with_label_values(&["ok"]).inc();
            }
            Err(err) => {
                tracing::warn!(%post_id, %asset_id, error = %err, "post image cleanup failed; asset orphaned");
                ASSET_CLEANUP_TOTAL.with_label_values(&["error"]).inc();
            }
        }
    }

    /// Toggle `actor`'s like on a post and return the resulting like set
    pub async fn like_unlike_post(&self, actor: Uuid, post_id: Uuid) -> Result<Vec<Uuid>> {
        observe("like", self.like_unlike_post_inner(actor, post_id).await)
    }

    async fn like_unlike_post_inner(&self, actor: Uuid, post_id: Uuid) -> Result<Vec<Uuid>> {
        let toggle = self
            .store
            .toggle_like(post_id, actor)
            .await?
            .ok_or_else(post_not_found)?;

        if toggle.liked {
            tracing::debug!(%post_id, %actor, "post liked");
            self.notifications
                .notify(actor, toggle.author_id, NotificationType::Like)
                .await?;
        } else {
            tracing::debug!(%post_id, %actor, "post unliked");
        }

        Ok(toggle.likes)
    }

    /// Append a comment and return the joined post
    pub async fn comment_on_post(
        &self,
        actor: Uuid,
        post_id: Uuid,
        text: Option<&str>,
    ) -> Result<PostView> {
        observe("comment", self.comment_on_post_inner(actor, post_id, text).await)
    }

    async fn comment_on_post_inner(
        &self,
        actor: Uuid,
        post_id: Uuid,
        text: Option<&str>,
    ) -> Result<PostView> {
        let text = non_blank(text)
            .ok_or_else(|| AppError::InvalidArgument("Text field is required".to_string()))?;

        let post = self
            .store
            .push_comment(post_id, actor, text)
            .await?
            .ok_or_else(post_not_found)?;

        self.notifications
            .notify(actor, post.author_id, NotificationType::Comment)
            .await?;

        feed::compose_one(self.store.as_ref(), post).await
    }

    /// Every post, most recent first
    pub async fn get_all_posts(&self) -> Result<Vec<PostView>> {
        observe("feed_all", self.feed(PostFilter::All).await)
    }

    /// Posts by the users `actor` follows
    pub async fn get_following_posts(&self, actor: Uuid) -> Result<Vec<PostView>> {
        let result: Result<Vec<PostView>> = async {
            let user = self.require_user(actor).await?;
            self.feed(PostFilter::AuthoredByAny(&user.following)).await
        }
        .await;
        observe("feed_following", result)
    }

    /// Posts the given user has liked
    pub async fn get_liked_posts(&self, user_id: Uuid) -> Result<Vec<PostView>> {
        let result: Result<Vec<PostView>> = async {
            let user = self.require_user(user_id).await?;
            self.feed(PostFilter::Ids(&user.liked_posts)).await
        }
        .await;
        observe("feed_liked", result)
    }

    /// Posts written by the user with `username`
    pub async fn get_user_posts(&self, username: &str) -> Result<Vec<PostView>> {
        let result: Result<Vec<PostView>> = async {
            let user = self
                .store
                .find_user_by_username(username)
                .await?
                .ok_or_else(user_not_found)?;
            self.feed(PostFilter::AuthoredByAny(&[user.id])).await
        }
        .await;
        observe("feed_user", result)
    }

    async fn feed(&self, filter: PostFilter<'_>) -> Result<Vec<PostView>> {
        if matches!(filter, PostFilter::AuthoredByAny([]) | PostFilter::Ids([])) {
            return Ok(Vec::new());
        }
        let posts = self.store.find_posts(filter).await?;
        feed::compose(self.store.as_ref(), posts).await
    }
}
