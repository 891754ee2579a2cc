use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    Error, HttpMessage, HttpResponse,
};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Cookie the web client stores its session token in
pub const SESSION_COOKIE: &str = "jwt";

/// Authenticated actor extracted from the session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub Uuid);

/// Claims carried by a session token.
///
/// Tokens minted by the auth service put the user id in `userId`; standard
/// tooling uses `sub`. Both are accepted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    #[serde(alias = "userId")]
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unauthorized: No Token Provided")]
    MissingToken,

    #[error("Unauthorized: Invalid Token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("Unauthorized: Invalid Token")]
    MalformedSubject(#[source] uuid::Error),
}

/// Validates session tokens against the shared HS256 secret.
///
/// Token issuance lives in the auth service; this side only verifies.
pub struct SessionValidator {
    key: DecodingKey,
    validation: Validation,
}

impl SessionValidator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<ActorId, SessionError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(SessionError::InvalidToken)?;

        Uuid::parse_str(&data.claims.sub)
            .map(ActorId)
            .map_err(SessionError::MalformedSubject)
    }
}

/// Session authentication middleware.
///
/// Reads the token from the `jwt` cookie, falling back to an
/// `Authorization: Bearer` header, and stores the resolved [`ActorId`] in the
/// request extensions. Rejections are JSON `{"error": ...}` bodies with 401.
#[derive(Clone)]
pub struct SessionAuthMiddleware {
    validator: Arc<SessionValidator>,
}

impl SessionAuthMiddleware {
    pub fn new(validator: Arc<SessionValidator>) -> Self {
        Self { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddlewareService {
            service: Rc::new(service),
            validator: self.validator.clone(),
        }))
    }
}

pub struct SessionAuthMiddlewareService<S> {
    service: Rc<S>,
    validator: Arc<SessionValidator>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let validator = self.validator.clone();

        Box::pin(async move {
            let token = session_token(&req).ok_or_else(|| reject(SessionError::MissingToken))?;

            let actor = validator.validate(&token).map_err(|e| {
                tracing::warn!(error = ?e, path = %req.path(), "session token rejected");
                reject(e)
            })?;

            req.extensions_mut().insert(actor);

            service.call(req).await
        })
    }
}

fn session_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn reject(err: SessionError) -> Error {
    let message = err.to_string();
    let response = HttpResponse::Unauthorized().json(serde_json::json!({ "error": message }));
    InternalError::from_response(err, response).into()
}

/// FromRequest implementation for ActorId
impl actix_web::FromRequest for ActorId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<ActorId>() {
            Some(actor) => ready(Ok(*actor)),
            None => ready(Err(reject(SessionError::MissingToken))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::{http::StatusCode, test, web, App};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token_for(sub: &str, secret: &str, ttl_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: sub.to_string(),
            iat: now,
            exp: now + ttl_secs,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    async fn whoami(actor: ActorId) -> HttpResponse {
        HttpResponse::Ok().body(actor.0.to_string())
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new().service(
                    web::scope("")
                        .wrap(SessionAuthMiddleware::new(Arc::new(SessionValidator::new(
                            SECRET,
                        ))))
                        .route("/whoami", web::get().to(whoami)),
                ),
            )
            .await
        };
    }

    #[::core::prelude::v1::test]
    fn validate_accepts_user_id_claim_alias() {
        let user_id = Uuid::new_v4();
        let now = chrono::Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "userId": user_id.to_string(), "iat": now, "exp": now + 60 }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let actor = SessionValidator::new(SECRET).validate(&token).unwrap();
        assert_eq!(actor, ActorId(user_id));
    }

    #[::core::prelude::v1::test]
    fn validate_rejects_wrong_secret_and_bad_subject() {
        let validator = SessionValidator::new(SECRET);

        let forged = token_for(&Uuid::new_v4().to_string(), "other-secret", 60);
        assert!(matches!(
            validator.validate(&forged),
            Err(SessionError::InvalidToken(_))
        ));

        let bad_sub = token_for("not-a-uuid", SECRET, 60);
        assert!(matches!(
            validator.validate(&bad_sub),
            Err(SessionError::MalformedSubject(_))
        ));
    }

    #[::core::prelude::v1::test]
    fn validate_rejects_expired_token() {
        let expired = token_for(&Uuid::new_v4().to_string(), SECRET, -3600);
        assert!(SessionValidator::new(SECRET).validate(&expired).is_err());
    }

    #[actix_rt::test]
    async fn cookie_token_resolves_actor() {
        let app = app!();
        let user_id = Uuid::new_v4();

        let req = test::TestRequest::get()
            .uri("/whoami")
            .cookie(Cookie::new(SESSION_COOKIE, token_for(&user_id.to_string(), SECRET, 60)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[actix_rt::test]
    async fn bearer_header_is_accepted() {
        let app = app!();
        let user_id = Uuid::new_v4();

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((
                "Authorization",
                format!("Bearer {}", token_for(&user_id.to_string(), SECRET, 60)),
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn missing_token_is_401_with_json_error() {
        let app = app!();

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::try_call_service(&app, req).await;
        let err = match resp {
            Ok(resp) => panic!("expected rejection, got {}", resp.status()),
            Err(err) => err,
        };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Unauthorized: No Token Provided");
    }
}
