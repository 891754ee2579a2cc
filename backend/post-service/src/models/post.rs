use super::user::PublicUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post document
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: Option<String>,
    pub image: Option<String>,
    /// Users who like the post; never holds duplicates
    pub likes: Vec<Uuid>,
    /// Append-only, oldest first
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when writing a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text: Option<String>,
    pub image: Option<String>,
}

/// A post joined with its author and commenters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: PublicUser,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// `None` once the commenter's account is gone
    pub user: Option<PublicUser>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
