/// PostgreSQL document store
///
/// Likes live in one `post_likes` table that serves both `Post.likes` and
/// `User.liked_posts`, so the two sides cannot drift apart. Toggling takes a
/// row lock on the post, which also serialises concurrent toggles by the
/// same actor.
use super::{LikeToggle, PostFilter, PostStore};
use crate::error::{AppError, Result};
use crate::models::{Comment, NewNotification, NewPost, Notification, Post, User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.full_name, u.email, u.password_hash,
           u.profile_img, u.cover_img, u.bio, u.link,
           ARRAY(SELECT f.follower_id FROM user_follows f
                 WHERE f.followee_id = u.id ORDER BY f.created_at) AS followers,
           ARRAY(SELECT f.followee_id FROM user_follows f
                 WHERE f.follower_id = u.id ORDER BY f.created_at) AS following,
           ARRAY(SELECT l.post_id FROM post_likes l
                 WHERE l.user_id = u.id ORDER BY l.created_at) AS liked_posts,
           u.created_at, u.updated_at
    FROM users u
"#;

const POST_SELECT: &str = r#"
    SELECT p.id, p.author_id, p.text, p.image,
           ARRAY(SELECT l.user_id FROM post_likes l
                 WHERE l.post_id = p.id ORDER BY l.created_at, l.user_id) AS likes,
           p.created_at, p.updated_at
    FROM posts p
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    text: Option<String>,
    image: Option<String>,
    likes: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    from_user_id: Uuid,
    to_user_id: Uuid,
    kind: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self> {
        Ok(Notification {
            id: row.id,
            from: row.from_user_id,
            to: row.to_user_id,
            kind: row.kind.parse().map_err(AppError::Internal)?,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

/// Attach comments (already in append order) to their posts
fn assemble_posts(rows: Vec<PostRow>, comments: Vec<CommentRow>) -> Vec<Post> {
    let mut by_post: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for c in comments {
        by_post.entry(c.post_id).or_default().push(Comment {
            id: c.id,
            author_id: c.author_id,
            text: c.text,
            created_at: c.created_at,
        });
    }

    rows.into_iter()
        .map(|row| Post {
            comments: by_post.remove(&row.id).unwrap_or_default(),
            id: row.id,
            author_id: row.author_id,
            text: row.text,
            image: row.image,
            likes: row.likes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect()
}

#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, rows: Vec<PostRow>) -> Result<Vec<Post>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let comments = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, author_id, text, created_at
            FROM post_comments
            WHERE post_id = ANY($1)
            ORDER BY seq
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble_posts(rows, comments))
    }
}

#[async_trait::async_trait]
impl PostStore for PgPostStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE u.id = $1", USER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE u.username = $1", USER_SELECT))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, User>(&format!("{} WHERE u.id = ANY($1)", USER_SELECT))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (author_id, text, image)
            VALUES ($1, $2, $3)
            RETURNING id, author_id, text, image, ARRAY[]::uuid[] AS likes,
                      created_at, updated_at
            "#,
        )
        .bind(post.author_id)
        .bind(post.text)
        .bind(post.image)
        .fetch_one(&self.pool)
        .await?;

        assemble_posts(vec![row], Vec::new())
            .pop()
            .ok_or_else(|| AppError::Internal("insert returned no post".to_string()))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{} WHERE p.id = $1", POST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_posts(&self, filter: PostFilter<'_>) -> Result<Vec<Post>> {
        let rows = match filter {
            PostFilter::All => {
                sqlx::query_as::<_, PostRow>(POST_SELECT)
                    .fetch_all(&self.pool)
                    .await?
            }
            PostFilter::AuthoredByAny(authors) => {
                sqlx::query_as::<_, PostRow>(&format!(
                    "{} WHERE p.author_id = ANY($1)",
                    POST_SELECT
                ))
                .bind(authors)
                .fetch_all(&self.pool)
                .await?
            }
            PostFilter::Ids(ids) => {
                sqlx::query_as::<_, PostRow>(&format!("{} WHERE p.id = ANY($1)", POST_SELECT))
                    .bind(ids)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        self.hydrate(rows).await
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        // Likes and comments cascade.
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>> {
        let mut tx = self.pool.begin().await?;

        let author_id: Option<Uuid> =
            sqlx::query_scalar("SELECT author_id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(author_id) = author_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        let unliked = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !unliked {
            sqlx::query(
                r#"
                INSERT INTO post_likes (post_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (post_id, user_id) DO NOTHING
                "#,
            )
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE posts SET updated_at = NOW() WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        let likes: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM post_likes WHERE post_id = $1 ORDER BY created_at, user_id",
        )
        .bind(post_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(LikeToggle {
            liked: !unliked,
            author_id,
            likes,
        }))
    }

    async fn push_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Option<Post>> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE posts SET updated_at = NOW() WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if touched == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("INSERT INTO post_comments (post_id, author_id, text) VALUES ($1, $2, $3)")
            .bind(post_id)
            .bind(author_id)
            .bind(text)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.find_post(post_id).await
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (from_user_id, to_user_id, kind)
            VALUES ($1, $2, $3)
            RETURNING id, from_user_id, to_user_id, kind, read, created_at
            "#,
        )
        .bind(notification.from)
        .bind(notification.to)
        .bind(notification.kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_notifications(&self, recipient: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, from_user_id, to_user_id, kind, read, created_at
            FROM notifications
            WHERE to_user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_notifications_read(&self, recipient: Uuid, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE to_user_id = $1 AND id = ANY($2) AND NOT read",
        )
        .bind(recipient)
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_notifications(&self, recipient: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE to_user_id = $1")
            .bind(recipient)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
