/// Post handlers - HTTP endpoints under `/api/posts`
use crate::error::{AppError, Result};
use crate::AppState;
use actix_middleware::ActorId;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct CreatePostRequest {
    pub text: Option<String>,
    /// `data:image/...;base64,...` URI
    pub img: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    pub text: Option<String>,
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} not found", what)))
}

/// GET /api/posts/all
pub async fn get_all_posts(state: web::Data<AppState>, _actor: ActorId) -> Result<HttpResponse> {
    let posts = state.posts.get_all_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/following
pub async fn get_following_posts(
    state: web::Data<AppState>,
    actor: ActorId,
) -> Result<HttpResponse> {
    let posts = state.posts.get_following_posts(actor.0).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/likes/{id}
pub async fn get_liked_posts(
    state: web::Data<AppState>,
    _actor: ActorId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = parse_id(&path, "User")?;
    let posts = state.posts.get_liked_posts(user_id).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/user/{username}
pub async fn get_user_posts(
    state: web::Data<AppState>,
    _actor: ActorId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let posts = state.posts.get_user_posts(&path).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// POST /api/posts/create
pub async fn create_post(
    state: web::Data<AppState>,
    actor: ActorId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = state
        .posts
        .create_post(actor.0, req.text.as_deref(), req.img.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&path, "Post")?;
    state.posts.delete_post(actor.0, post_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post deleted successfully"
    })))
}

/// POST /api/posts/like/{id}
pub async fn like_unlike_post(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&path, "Post")?;
    let likes = state.posts.like_unlike_post(actor.0, post_id).await?;
    Ok(HttpResponse::Ok().json(likes))
}

/// POST /api/posts/comments/{id}
pub async fn comment_on_post(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&path, "Post")?;
    let post = state
        .posts
        .comment_on_post(actor.0, post_id, req.text.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}
