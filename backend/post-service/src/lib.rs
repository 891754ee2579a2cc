/// Post Service Library
///
/// Posts, likes, comments, the four feeds, and the notifications they fan
/// out, for the Chirp web client.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the route table
/// - `models`: posts, comments, users, notifications and their client views
/// - `services`: business logic layer
/// - `db`: document store trait with PostgreSQL and in-memory backends
/// - `assets`: image asset store trait with S3 and in-memory backends
/// - `error`: error types and HTTP mapping
/// - `config`: configuration management
/// - `metrics`: Prometheus counters
pub mod assets;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use assets::AssetStore;
use db::PostStore;
use services::{NotificationService, PostService};
use std::sync::Arc;

/// Shared handler state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub notifications: NotificationService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PostStore>,
        assets: Arc<dyn AssetStore>,
        max_image_bytes: usize,
    ) -> Self {
        let notifications = NotificationService::new(store.clone());
        let posts = PostService::new(store, assets, notifications.clone(), max_image_bytes);
        Self {
            posts,
            notifications,
        }
    }
}
