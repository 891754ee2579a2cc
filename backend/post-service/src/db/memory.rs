/// In-memory document store
///
/// Every method takes the single collection lock, so multi-document updates
/// (the two sides of a like) are atomic just like the transactional
/// PostgreSQL store.
use super::{LikeToggle, PostFilter, PostStore};
use crate::error::{AppError, Result};
use crate::models::{Comment, NewNotification, NewPost, Notification, Post, User};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    notifications: Vec<Notification>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Collections {
    /// Strictly increasing timestamps so recency ordering is total
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

#[derive(Default)]
pub struct InMemoryPostStore {
    inner: RwLock<Collections>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user document (user management is owned elsewhere)
    pub async fn insert_user(&self, user: User) {
        self.inner.write().await.users.insert(user.id, user);
    }

    /// Record that `follower` follows `followee`
    pub async fn follow(&self, follower: Uuid, followee: Uuid) {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.get_mut(&follower) {
            if !user.following.contains(&followee) {
                user.following.push(followee);
            }
        }
        if let Some(user) = inner.users.get_mut(&followee) {
            if !user.followers.contains(&follower) {
                user.followers.push(follower);
            }
        }
    }

    /// Every stored notification, oldest first
    pub async fn all_notifications(&self) -> Vec<Notification> {
        self.inner.read().await.notifications.clone()
    }
}

#[async_trait::async_trait]
impl PostStore for InMemoryPostStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect())
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let mut inner = self.inner.write().await;
        let now = inner.tick();
        let post = Post {
            id: Uuid::new_v4(),
            author_id: post.author_id,
            text: post.text,
            image: post.image,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.inner.read().await.posts.get(&id).cloned())
    }

    async fn find_posts(&self, filter: PostFilter<'_>) -> Result<Vec<Post>> {
        let inner = self.inner.read().await;
        let posts = inner.posts.values().filter(|post| match filter {
            PostFilter::All => true,
            PostFilter::AuthoredByAny(authors) => authors.contains(&post.author_id),
            PostFilter::Ids(ids) => ids.contains(&post.id),
        });
        Ok(posts.cloned().collect())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.posts.remove(&id).is_none() {
            return Ok(false);
        }
        for user in inner.users.values_mut() {
            user.liked_posts.retain(|liked| *liked != id);
        }
        Ok(true)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>> {
        let mut inner = self.inner.write().await;
        if !inner.posts.contains_key(&post_id) {
            return Ok(None);
        }
        // post_likes.user_id references users(id)
        if !inner.users.contains_key(&user_id) {
            return Err(AppError::Internal(format!(
                "like by unknown user {} violates post_likes foreign key",
                user_id
            )));
        }
        let now = inner.tick();

        let Some(post) = inner.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        let liked = if post.likes.contains(&user_id) {
            post.likes.retain(|id| *id != user_id);
            false
        } else {
            post.likes.push(user_id);
            true
        };
        post.updated_at = now;
        let toggle = LikeToggle {
            liked,
            author_id: post.author_id,
            likes: post.likes.clone(),
        };

        if let Some(user) = inner.users.get_mut(&user_id) {
            user.liked_posts.retain(|id| *id != post_id);
            if liked {
                user.liked_posts.push(post_id);
            }
        }

        Ok(Some(toggle))
    }

    async fn push_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Option<Post>> {
        let mut inner = self.inner.write().await;
        let now = inner.tick();

        let Some(post) = inner.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        post.comments.push(Comment {
            id: Uuid::new_v4(),
            author_id,
            text: text.to_string(),
            created_at: now,
        });
        post.updated_at = now;

        Ok(Some(post.clone()))
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
        let mut inner = self.inner.write().await;
        let stored = Notification {
            id: Uuid::new_v4(),
            from: notification.from,
            to: notification.to,
            kind: notification.kind,
            read: false,
            created_at: inner.tick(),
        };
        inner.notifications.push(stored.clone());
        Ok(stored)
    }

    async fn find_notifications(&self, recipient: Uuid) -> Result<Vec<Notification>> {
        let inner = self.inner.read().await;
        let mut found: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| n.to == recipient)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn mark_notifications_read(&self, recipient: Uuid, ids: &[Uuid]) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut updated = 0;
        for n in inner
            .notifications
            .iter_mut()
            .filter(|n| n.to == recipient && !n.read && ids.contains(&n.id))
        {
            n.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_notifications(&self, recipient: Uuid) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.notifications.len();
        inner.notifications.retain(|n| n.to != recipient);
        Ok((before - inner.notifications.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user() -> (InMemoryPostStore, User) {
        let store = InMemoryPostStore::new();
        let user = User::new("ada", "Ada Lovelace", "ada@example.com", "hash");
        store.insert_user(user.clone()).await;
        (store, user)
    }

    #[tokio::test]
    async fn toggle_like_keeps_both_sides_in_step() {
        let (store, user) = store_with_user().await;
        let post = store
            .insert_post(NewPost {
                author_id: user.id,
                text: Some("hi".into()),
                image: None,
            })
            .await
            .unwrap();

        let first = store.toggle_like(post.id, user.id).await.unwrap().unwrap();
        assert!(first.liked);
        assert_eq!(first.likes, vec![user.id]);
        let liker = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(liker.liked_posts, vec![post.id]);

        let second = store.toggle_like(post.id, user.id).await.unwrap().unwrap();
        assert!(!second.liked);
        assert!(second.likes.is_empty());
        let liker = store.find_user(user.id).await.unwrap().unwrap();
        assert!(liker.liked_posts.is_empty());
    }

    #[tokio::test]
    async fn toggle_like_by_unknown_user_is_rejected() {
        let (store, user) = store_with_user().await;
        let post = store
            .insert_post(NewPost {
                author_id: user.id,
                text: Some("hi".into()),
                image: None,
            })
            .await
            .unwrap();

        let err = store.toggle_like(post.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        let post = store.find_post(post.id).await.unwrap().unwrap();
        assert!(post.likes.is_empty());
    }

    #[tokio::test]
    async fn toggle_like_on_missing_post_is_none() {
        let (store, user) = store_with_user().await;
        assert!(store
            .toggle_like(Uuid::new_v4(), user.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_post_scrubs_liked_posts() {
        let (store, user) = store_with_user().await;
        let post = store
            .insert_post(NewPost {
                author_id: user.id,
                text: Some("bye".into()),
                image: None,
            })
            .await
            .unwrap();
        store.toggle_like(post.id, user.id).await.unwrap();

        assert!(store.delete_post(post.id).await.unwrap());
        assert!(!store.delete_post(post.id).await.unwrap());
        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert!(user.liked_posts.is_empty());
    }

    #[tokio::test]
    async fn timestamps_are_strictly_increasing() {
        let (store, user) = store_with_user().await;
        let mut last = None;
        for i in 0..20 {
            let post = store
                .insert_post(NewPost {
                    author_id: user.id,
                    text: Some(format!("post {}", i)),
                    image: None,
                })
                .await
                .unwrap();
            if let Some(prev) = last {
                assert!(post.created_at > prev);
            }
            last = Some(post.created_at);
        }
    }
}
