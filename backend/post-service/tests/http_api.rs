//! HTTP surface: routing, session handling, status codes, and JSON shapes.

use actix_middleware::{SessionAuthMiddleware, SessionClaims, SessionValidator, SESSION_COOKIE};
use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use post_service::assets::InMemoryAssetStore;
use post_service::db::InMemoryPostStore;
use post_service::models::User;
use post_service::{handlers, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const SECRET: &str = "integration-secret";
const MAX_IMAGE_BYTES: usize = 1024 * 1024;
const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn token_for(user_id: Uuid) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn session(user_id: Uuid) -> Cookie<'static> {
    Cookie::new(SESSION_COOKIE, token_for(user_id))
}

macro_rules! app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(
                    $store.clone(),
                    Arc::new(InMemoryAssetStore::default()),
                    MAX_IMAGE_BYTES,
                )))
                .configure(|cfg| {
                    handlers::configure(
                        cfg,
                        SessionAuthMiddleware::new(Arc::new(SessionValidator::new(SECRET))),
                        MAX_IMAGE_BYTES,
                    )
                }),
        )
        .await
    };
}

async fn seeded() -> (Arc<InMemoryPostStore>, User, User) {
    let store = Arc::new(InMemoryPostStore::new());
    let alice = User::new("alice", "Alice A", "alice@example.com", "hash-a");
    let bob = User::new("bob", "Bob B", "bob@example.com", "hash-b");
    store.insert_user(alice.clone()).await;
    store.insert_user(bob.clone()).await;
    (store, alice, bob)
}

#[actix_web::test]
async fn health_is_open() {
    let (store, _, _) = seeded().await;
    let app = app!(store);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn post_routes_require_a_session() {
    let (store, _, _) = seeded().await;
    let app = app!(store);

    let req = test::TestRequest::get().uri("/api/posts/all").to_request();
    let resp = test::try_call_service(&app, req).await;
    let err = match resp {
        Ok(resp) => panic!("expected rejection, got {}", resp.status()),
        Err(err) => err,
    };
    let resp = err.error_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Unauthorized: No Token Provided");
}

#[actix_web::test]
async fn create_and_fetch_post_json_shape() {
    let (store, alice, _) = seeded().await;
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .cookie(session(alice.id))
        .set_json(json!({ "text": "first post", "img": PNG_URI }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let post: Value = test::read_body_json(resp).await;

    assert_eq!(post["text"], "first post");
    assert!(post["_id"].is_string());
    assert!(post["img"].as_str().unwrap().ends_with(".png"));
    assert_eq!(post["user"]["_id"], alice.id.to_string());
    assert_eq!(post["user"]["fullName"], "Alice A");
    assert!(post["user"].get("password").is_none());
    assert!(post["createdAt"].is_string());
    assert_eq!(post["likes"], json!([]));

    let req = test::TestRequest::get()
        .uri("/api/posts/user/alice")
        .cookie(session(alice.id))
        .to_request();
    let feed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(feed.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn empty_post_is_400() {
    let (store, alice, _) = seeded().await;
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .cookie(session(alice.id))
        .set_json(json!({ "text": "  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn like_comment_and_notifications_flow() {
    let (store, alice, bob) = seeded().await;
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .cookie(session(alice.id))
        .set_json(json!({ "text": "like me" }))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    let post_id = post["_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/like/{}", post_id))
        .cookie(session(bob.id))
        .to_request();
    let likes: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(likes, json!([bob.id.to_string()]));

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/comments/{}", post_id))
        .cookie(session(bob.id))
        .set_json(json!({ "text": "nice" }))
        .to_request();
    let commented: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(commented["comments"][0]["text"], "nice");
    assert_eq!(commented["comments"][0]["user"]["username"], "bob");

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/likes/{}", bob.id))
        .cookie(session(bob.id))
        .to_request();
    let liked: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(liked[0]["_id"], post_id.as_str());

    let req = test::TestRequest::get()
        .uri("/api/notifications")
        .cookie(session(alice.id))
        .to_request();
    let inbox: Value = test::call_and_read_body_json(&app, req).await;
    let inbox = inbox.as_array().unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0]["type"], "comment");
    assert_eq!(inbox[1]["type"], "like");
    assert_eq!(inbox[0]["from"]["username"], "bob");

    let req = test::TestRequest::delete()
        .uri("/api/notifications")
        .cookie(session(alice.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Notifications deleted successfully");
}

#[actix_web::test]
async fn delete_by_non_owner_is_401_and_owner_succeeds() {
    let (store, alice, bob) = seeded().await;
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .cookie(session(alice.id))
        .set_json(json!({ "text": "keep out" }))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/posts/{}", post["_id"].as_str().unwrap());

    let req = test::TestRequest::delete()
        .uri(&uri)
        .cookie(session(bob.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .cookie(session(alice.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Post deleted successfully");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .cookie(session(alice.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unknown_ids_are_404() {
    let (store, alice, _) = seeded().await;
    let app = app!(store);

    for uri in [
        "/api/posts/like/not-a-uuid".to_string(),
        format!("/api/posts/like/{}", Uuid::new_v4()),
    ] {
        let req = test::TestRequest::post()
            .uri(&uri)
            .cookie(session(alice.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }

    let req = test::TestRequest::get()
        .uri("/api/posts/user/nobody")
        .cookie(session(alice.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "User not found");
}

#[actix_web::test]
async fn following_feed_for_deleted_actor_is_404() {
    let (store, _, _) = seeded().await;
    let app = app!(store);

    let req = test::TestRequest::get()
        .uri("/api/posts/following")
        .cookie(session(Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
