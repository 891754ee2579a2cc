/// Data models for post-service
///
/// - `user`: the externally owned User document and its public projection
/// - `post`: posts, comments, and the joined views returned to clients
/// - `notification`: fan-out records and their client view
pub mod notification;
pub mod post;
pub mod user;

pub use notification::{
    NewNotification, Notification, NotificationSender, NotificationType, NotificationView,
};
pub use post::{Comment, CommentView, NewPost, Post, PostView};
pub use user::{PublicUser, User};
