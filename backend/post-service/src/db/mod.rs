/// Database access layer
///
/// `PostStore` is the document-store capability the services consume. It is
/// constructed once at startup and handed to services as `Arc<dyn PostStore>`;
/// `PgPostStore` backs production, `InMemoryPostStore` backs tests and local runs.
use crate::error::Result;
use crate::models::{NewNotification, NewPost, Notification, Post, User};
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryPostStore;
pub use postgres::PgPostStore;

/// Which posts a feed query selects
#[derive(Debug, Clone, Copy)]
pub enum PostFilter<'a> {
    All,
    /// Posts written by any of these users
    AuthoredByAny(&'a [Uuid]),
    /// Posts with one of these ids
    Ids(&'a [Uuid]),
}

/// Outcome of a like toggle
#[derive(Debug, Clone, PartialEq)]
pub struct LikeToggle {
    /// `true` when the toggle added the like
    pub liked: bool,
    pub author_id: Uuid,
    /// Full like set after the toggle
    pub likes: Vec<Uuid>,
}

#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Batch lookup; ids with no user are skipped
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    async fn insert_post(&self, post: NewPost) -> Result<Post>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;

    /// Posts matching `filter`, in no particular order
    async fn find_posts(&self, filter: PostFilter<'_>) -> Result<Vec<Post>>;

    /// Remove a post with its likes and comments. Returns false when absent.
    async fn delete_post(&self, id: Uuid) -> Result<bool>;

    /// Add or remove `user_id` from the post's likes and the post from the
    /// user's liked posts, as one atomic step. `None` when the post is absent.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>>;

    /// Append a comment; returns the updated post, `None` when absent
    async fn push_comment(&self, post_id: Uuid, author_id: Uuid, text: &str)
        -> Result<Option<Post>>;

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification>;

    /// Notifications addressed to `recipient`, newest first
    async fn find_notifications(&self, recipient: Uuid) -> Result<Vec<Notification>>;

    /// Mark the given notifications read. Ids not addressed to `recipient`
    /// are left alone.
    async fn mark_notifications_read(&self, recipient: Uuid, ids: &[Uuid]) -> Result<u64>;

    async fn delete_notifications(&self, recipient: Uuid) -> Result<u64>;
}
