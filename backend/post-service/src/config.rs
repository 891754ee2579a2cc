/// Configuration management for Post Service
///
/// Loaded from environment variables (after `.env`, when present) with
/// development defaults. Production refuses insecure defaults.
use s3_utils::S3Config;
use serde::{Deserialize, Serialize};

const DEV_JWT_SECRET: &str = "dev-only-secret-change-me";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub s3: S3Config,
    pub media: MediaConfig,
    pub log: LogConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// Use the in-memory store instead of PostgreSQL (local runs only)
    pub in_memory: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret the auth service signs session tokens with
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

/// Post image handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub max_image_bytes: usize,
    /// Object key prefix for post images
    pub asset_key_prefix: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 5 * 1024 * 1024,
            asset_key_prefix: "posts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let app = AppConfig {
            env: app_env,
            host: std::env::var("POST_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or_default("POST_SERVICE_PORT", 5001)?,
        };
        let production = app.is_production();

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:3000".to_string(),
            };
            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }
            CorsConfig { allowed_origins }
        };

        let in_memory = parse_env_or_default("POST_STORE_IN_MEMORY", false)?;
        if production && in_memory {
            return Err("POST_STORE_IN_MEMORY cannot be enabled in production".to_string());
        }
        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/chirp".to_string()),
            in_memory,
        };

        let auth = {
            let jwt_secret = match std::env::var("JWT_SECRET") {
                Ok(secret) if !secret.trim().is_empty() => secret,
                _ if production => return Err("JWT_SECRET must be set in production".to_string()),
                _ => DEV_JWT_SECRET.to_string(),
            };
            if production && jwt_secret == DEV_JWT_SECRET {
                return Err("JWT_SECRET must not use the development default".to_string());
            }
            AuthConfig { jwt_secret }
        };

        let media_defaults = MediaConfig::default();
        let media = MediaConfig {
            max_image_bytes: parse_env_or_default(
                "MAX_IMAGE_BYTES",
                media_defaults.max_image_bytes,
            )?,
            asset_key_prefix: std::env::var("ASSET_KEY_PREFIX")
                .unwrap_or(media_defaults.asset_key_prefix),
        };

        let log = LogConfig {
            json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(production),
        };

        Ok(Config {
            app,
            cors,
            database,
            auth,
            s3: S3Config::from_env(),
            media,
            log,
        })
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
