use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User document as stored. Owned by the auth service; read here.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub liked_posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str, full_name: &str, email: &str, password_hash: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            profile_img: None,
            cover_img: None,
            bio: None,
            link: None,
            followers: Vec::new(),
            following: Vec::new(),
            liked_posts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Everything about a user that may leave the service.
///
/// Has no password field at all, so a joined feed cannot leak one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub liked_posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            profile_img: user.profile_img.clone(),
            cover_img: user.cover_img.clone(),
            bio: user.bio.clone(),
            link: user.link.clone(),
            followers: user.followers.clone(),
            following: user.following.clone(),
            liked_posts: user.liked_posts.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
