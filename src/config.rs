// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Minutes an email verification code stays valid.
pub const OTP_TTL_MINUTES: i64 = 15;

/// Default per-exam score ceiling when none is configured.
pub const DEFAULT_MAX_SCORE: i64 = 100;

/// Number of rows returned by the public leaderboard.
pub const LEADERBOARD_LIMIT: i64 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,

    pub admin_email: Option<String>,
    pub admin_password: Option<String>,

    /// Policy for timer-expiry auto-submits that arrive without an uploaded
    /// answer file. `false` rejects them with 400; `true` records an empty
    /// submission (NULL file URL).
    pub accept_empty_submissions: bool,

    // SMTP settings. When smtp_host is unset, OTP codes are logged instead
    // of emailed (development mode).
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,

    /// External blob store endpoint the upload handler forwards files to.
    pub blob_store_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let accept_empty_submissions = env::var("ACCEPT_EMPTY_SUBMISSIONS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            accept_empty_submissions,
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM").ok(),
            blob_store_url: env::var("BLOB_STORE_URL").ok(),
        }
    }
}
