/// Notification fan-out and the recipient's read side.
///
/// Every like or comment by someone other than the post's author produces a
/// new notification record. Nothing is batched or deduplicated, and nothing
/// is ever produced for self-interaction.
use crate::db::PostStore;
use crate::error::Result;
use crate::metrics::NOTIFICATIONS_EMITTED_TOTAL;
use crate::models::{
    NewNotification, Notification, NotificationSender, NotificationType, NotificationView,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// The fan-out rule: a notification from `actor` to `owner`, unless they are the same user
pub fn fan_out(actor: Uuid, owner: Uuid, kind: NotificationType) -> Option<NewNotification> {
    if actor == owner {
        None
    } else {
        Some(NewNotification {
            from: actor,
            to: owner,
            kind,
        })
    }
}

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn PostStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// Apply the fan-out rule and write the notification, if any
    pub async fn notify(
        &self,
        actor: Uuid,
        owner: Uuid,
        kind: NotificationType,
    ) -> Result<Option<Notification>> {
        let Some(new) = fan_out(actor, owner, kind) else {
            debug!(%actor, %kind, "self-interaction, no notification");
            return Ok(None);
        };

        let stored = self.store.insert_notification(new).await?;
        NOTIFICATIONS_EMITTED_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();
        info!(
            notification_id = %stored.id,
            from = %stored.from,
            to = %stored.to,
            %kind,
            "notification created"
        );
        Ok(Some(stored))
    }

    /// The recipient's notifications, newest first, with senders resolved.
    /// Everything returned is marked read afterwards.
    pub async fn list_for(&self, recipient: Uuid) -> Result<Vec<NotificationView>> {
        let notifications = self.store.find_notifications(recipient).await?;
        if notifications.is_empty() {
            return Ok(Vec::new());
        }

        let mut sender_ids: Vec<Uuid> = notifications.iter().map(|n| n.from).collect();
        sender_ids.sort();
        sender_ids.dedup();
        let senders: HashMap<Uuid, NotificationSender> = self
            .store
            .find_users_by_ids(&sender_ids)
            .await?
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    NotificationSender {
                        id: u.id,
                        username: u.username,
                        profile_img: u.profile_img,
                    },
                )
            })
            .collect();

        // Only what is being shown; anything that arrived since stays unread.
        let shown: Vec<Uuid> = notifications.iter().map(|n| n.id).collect();
        let marked = self.store.mark_notifications_read(recipient, &shown).await?;
        debug!(%recipient, marked, "notifications marked read");

        Ok(notifications
            .into_iter()
            .map(|n| NotificationView {
                id: n.id,
                from: senders.get(&n.from).cloned(),
                to: n.to,
                kind: n.kind,
                read: n.read,
                created_at: n.created_at,
            })
            .collect())
    }

    /// Bulk-delete everything addressed to `recipient`
    pub async fn delete_all(&self, recipient: Uuid) -> Result<u64> {
        let deleted = self.store.delete_notifications(recipient).await?;
        info!(%recipient, deleted, "notifications deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryPostStore, LikeToggle, PostFilter};
    use crate::models::{NewPost, Post, User};

    #[test]
    fn fan_out_skips_self_interaction() {
        let user = Uuid::new_v4();
        assert!(fan_out(user, user, NotificationType::Like).is_none());
        assert!(fan_out(user, user, NotificationType::Comment).is_none());
    }

    #[test]
    fn fan_out_addresses_owner() {
        let (actor, owner) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            fan_out(actor, owner, NotificationType::Comment),
            Some(NewNotification {
                from: actor,
                to: owner,
                kind: NotificationType::Comment,
            })
        );
    }

    #[tokio::test]
    async fn repeated_interactions_are_not_deduplicated() {
        let store = Arc::new(InMemoryPostStore::new());
        let service = NotificationService::new(store.clone());
        let (actor, owner) = (Uuid::new_v4(), Uuid::new_v4());

        service.notify(actor, owner, NotificationType::Like).await.unwrap();
        service.notify(actor, owner, NotificationType::Like).await.unwrap();

        assert_eq!(store.all_notifications().await.len(), 2);
    }

    #[tokio::test]
    async fn listing_resolves_senders_and_marks_read() {
        let store = Arc::new(InMemoryPostStore::new());
        let sender = User::new("bob", "Bob", "bob@example.com", "hash");
        let recipient = User::new("alice", "Alice", "alice@example.com", "hash");
        store.insert_user(sender.clone()).await;
        store.insert_user(recipient.clone()).await;
        let service = NotificationService::new(store.clone());

        service
            .notify(sender.id, recipient.id, NotificationType::Like)
            .await
            .unwrap();
        service
            .notify(sender.id, recipient.id, NotificationType::Comment)
            .await
            .unwrap();

        let listed = service.list_for(recipient.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].kind, NotificationType::Comment);
        assert_eq!(listed[0].from.as_ref().unwrap().username, "bob");
        assert!(!listed[0].read);

        let again = service.list_for(recipient.id).await.unwrap();
        assert!(again.iter().all(|n| n.read));

        assert_eq!(service.delete_all(recipient.id).await.unwrap(), 2);
        assert!(service.list_for(recipient.id).await.unwrap().is_empty());
    }

    /// Delivers one extra notification right after a listing has been read,
    /// the way a concurrent like would.
    struct LateArrivalStore {
        inner: InMemoryPostStore,
        late: std::sync::Mutex<Option<NewNotification>>,
    }

    #[async_trait::async_trait]
    impl PostStore for LateArrivalStore {
        async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
            self.inner.find_user(id).await
        }

        async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
            self.inner.find_user_by_username(username).await
        }

        async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
            self.inner.find_users_by_ids(ids).await
        }

        async fn insert_post(&self, post: NewPost) -> Result<Post> {
            self.inner.insert_post(post).await
        }

        async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
            self.inner.find_post(id).await
        }

        async fn find_posts(&self, filter: PostFilter<'_>) -> Result<Vec<Post>> {
            self.inner.find_posts(filter).await
        }

        async fn delete_post(&self, id: Uuid) -> Result<bool> {
            self.inner.delete_post(id).await
        }

        async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>> {
            self.inner.toggle_like(post_id, user_id).await
        }

        async fn push_comment(
            &self,
            post_id: Uuid,
            author_id: Uuid,
            text: &str,
        ) -> Result<Option<Post>> {
            self.inner.push_comment(post_id, author_id, text).await
        }

        async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
            self.inner.insert_notification(notification).await
        }

        async fn find_notifications(&self, recipient: Uuid) -> Result<Vec<Notification>> {
            let found = self.inner.find_notifications(recipient).await?;
            let late = self.late.lock().unwrap().take();
            if let Some(late) = late {
                self.inner.insert_notification(late).await?;
            }
            Ok(found)
        }

        async fn mark_notifications_read(&self, recipient: Uuid, ids: &[Uuid]) -> Result<u64> {
            self.inner.mark_notifications_read(recipient, ids).await
        }

        async fn delete_notifications(&self, recipient: Uuid) -> Result<u64> {
            self.inner.delete_notifications(recipient).await
        }
    }

    #[tokio::test]
    async fn notification_arriving_during_listing_stays_unread() {
        let sender = User::new("bob", "Bob", "bob@example.com", "hash");
        let recipient = User::new("alice", "Alice", "alice@example.com", "hash");
        let store = Arc::new(LateArrivalStore {
            inner: InMemoryPostStore::new(),
            late: std::sync::Mutex::new(Some(NewNotification {
                from: sender.id,
                to: recipient.id,
                kind: NotificationType::Like,
            })),
        });
        store.inner.insert_user(sender.clone()).await;
        store.inner.insert_user(recipient.clone()).await;
        let service = NotificationService::new(store.clone());

        service
            .notify(sender.id, recipient.id, NotificationType::Comment)
            .await
            .unwrap();

        let first = service.list_for(recipient.id).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, NotificationType::Comment);

        let second = service.list_for(recipient.id).await.unwrap();
        assert_eq!(second.len(), 2);
        let like = second
            .iter()
            .find(|n| n.kind == NotificationType::Like)
            .unwrap();
        assert!(!like.read, "late like was marked read before it was shown");
        let comment = second
            .iter()
            .find(|n| n.kind == NotificationType::Comment)
            .unwrap();
        assert!(comment.read);
    }
}
