/// HTTP handlers and route table
///
/// Every `/api/posts` and `/api/notifications` route sits behind the session
/// middleware; `/api/v1/health` and `/metrics` are open.
pub mod health;
pub mod notifications;
pub mod posts;

use crate::error::AppError;
use actix_middleware::SessionAuthMiddleware;
use actix_web::{web, ResponseError};

pub use health::health;

/// JSON extractor settings sized for base64 image uploads. Malformed bodies
/// get the same `{"error": ...}` shape as every other failure.
pub fn json_config(max_image_bytes: usize) -> web::JsonConfig {
    // base64 inflates by 4/3, plus headroom for the text field
    let limit = max_image_bytes / 3 * 4 + 64 * 1024;
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let response = AppError::InvalidArgument(err.to_string()).error_response();
            actix_web::error::InternalError::from_response(err, response).into()
        })
}

/// Register the routes
pub fn configure(cfg: &mut web::ServiceConfig, auth: SessionAuthMiddleware, max_image_bytes: usize) {
    cfg.app_data(json_config(max_image_bytes))
        .route("/api/v1/health", web::get().to(health))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .service(
            web::scope("/api/posts")
                .wrap(auth.clone())
                .route("/all", web::get().to(posts::get_all_posts))
                .route("/following", web::get().to(posts::get_following_posts))
                .route("/likes/{id}", web::get().to(posts::get_liked_posts))
                .route("/user/{username}", web::get().to(posts::get_user_posts))
                .route("/create", web::post().to(posts::create_post))
                .route("/like/{id}", web::post().to(posts::like_unlike_post))
                .route("/comments/{id}", web::post().to(posts::comment_on_post))
                .route("/{id}", web::delete().to(posts::delete_post)),
        )
        .service(
            web::scope("/api/notifications").wrap(auth).service(
                web::resource("")
                    .route(web::get().to(notifications::list_notifications))
                    .route(web::delete().to(notifications::delete_notifications)),
            ),
        );
}
