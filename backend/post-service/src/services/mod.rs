/// Business logic layer
///
/// - `posts`: create/delete/like/comment and the feed queries
/// - `notifications`: like/comment fan-out and the recipient read side
/// - `feed`: joins posts with public author/commenter identities
/// - `authorization`: ownership checks for mutating operations
pub mod authorization;
pub mod feed;
pub mod notifications;
pub mod posts;

pub use notifications::NotificationService;
pub use posts::PostService;
