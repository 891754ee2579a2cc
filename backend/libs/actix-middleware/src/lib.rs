//! # Actix Middleware Library
//!
//! Shared middleware components for Chirp Actix services
//!
//! ## Modules
//! - `session_auth`: session token validation and the `ActorId` extractor
//! - `correlation_id`: per-request correlation ids

pub mod correlation_id;
pub mod session_auth;

pub use correlation_id::{CorrelationId, CorrelationIdMiddleware, CORRELATION_HEADER};
pub use session_auth::{
    ActorId, SessionAuthMiddleware, SessionClaims, SessionError, SessionValidator, SESSION_COOKIE,
};
