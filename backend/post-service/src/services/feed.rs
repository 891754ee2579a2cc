/// Feed composition: the read-side join from stored posts to client views.
///
/// Authors and commenters are resolved with one batched user lookup per call
/// and projected through `PublicUser`, which carries no credential fields.
use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::models::{CommentView, Post, PostView, PublicUser};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Most recent first; ties broken by id so the order is stable.
pub fn order_by_recency(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Every user a set of posts refers to, author or commenter
fn referenced_users(posts: &[Post]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    posts
        .iter()
        .flat_map(|p| std::iter::once(p.author_id).chain(p.comments.iter().map(|c| c.author_id)))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Join posts against a user directory.
///
/// A post whose author is gone cannot be shown and is dropped; a comment whose
/// author is gone keeps its text with no user attached.
pub fn join(posts: Vec<Post>, directory: &HashMap<Uuid, PublicUser>) -> Vec<PostView> {
    posts
        .into_iter()
        .filter_map(|post| {
            let Some(author) = directory.get(&post.author_id) else {
                tracing::warn!(post_id = %post.id, author_id = %post.author_id, "dropping post with unknown author");
                return None;
            };

            let comments = post
                .comments
                .into_iter()
                .map(|c| CommentView {
                    id: c.id,
                    user: directory.get(&c.author_id).cloned(),
                    text: c.text,
                    created_at: c.created_at,
                })
                .collect();

            Some(PostView {
                id: post.id,
                user: author.clone(),
                text: post.text,
                img: post.image,
                likes: post.likes,
                comments,
                created_at: post.created_at,
                updated_at: post.updated_at,
            })
        })
        .collect()
}

/// Order and join a feed
pub async fn compose(store: &dyn PostStore, mut posts: Vec<Post>) -> Result<Vec<PostView>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    order_by_recency(&mut posts);
    let users = store.find_users_by_ids(&referenced_users(&posts)).await?;
    let directory: HashMap<Uuid, PublicUser> =
        users.iter().map(|u| (u.id, PublicUser::from(u))).collect();

    Ok(join(posts, &directory))
}

/// Join a single post returned from a mutation.
///
/// The write has already happened, so an author that cannot be resolved is a
/// server-side inconsistency rather than a client error.
pub async fn compose_one(store: &dyn PostStore, post: Post) -> Result<PostView> {
    let (post_id, author_id) = (post.id, post.author_id);
    compose(store, vec![post]).await?.pop().ok_or_else(|| {
        AppError::Internal(format!(
            "author {} of post {} could not be resolved",
            author_id, post_id
        ))
    })
}
