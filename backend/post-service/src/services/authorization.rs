/// Ownership checks for post mutations.
///
/// There is no admin override: only a post's author may delete it.
use crate::error::{AppError, Result};
use crate::models::Post;
use uuid::Uuid;

/// Check that `actor` authored `post`
pub fn ensure_post_owner(actor: Uuid, post: &Post) -> Result<()> {
    if post.author_id == actor {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not authorized to delete this post".to_string(),
        ))
    }
}
