// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets (the session signing key) are injected as environment variables
//! by the hosting platform and read once at startup.

use std::env;

/// Name of the session cookie. Firebase Hosting only forwards `__session`
/// to backends, so the name is fixed.
pub const SESSION_COOKIE_NAME: &str = "__session";

/// Firebase session cookies may live between 5 minutes and 2 weeks.
const MIN_SESSION_DAYS: i64 = 1;
const MAX_SESSION_DAYS: i64 = 14;
const DEFAULT_SESSION_DAYS: i64 = 5;

const MIN_SIGNING_KEY_LEN: usize = 32;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase / GCP project ID (also the expected ID token audience)
    pub firebase_project_id: String,
    /// Public site URL, used for CORS, cookie flags and the sitemap
    pub site_url: String,
    /// Server port
    pub port: u16,
    /// Base URL of the Nominatim geocoding service
    pub nominatim_url: String,
    /// Session lifetime in days
    pub session_max_age_days: i64,

    /// HS256 key for session cookies (raw bytes)
    pub session_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let session_signing_key = env::var("SESSION_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
            .trim()
            .as_bytes()
            .to_vec();
        if session_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid(format!(
                "SESSION_SIGNING_KEY must be at least {MIN_SIGNING_KEY_LEN} bytes"
            )));
        }

        Ok(Self {
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
            site_url: env::var("SITE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            nominatim_url: env::var("NOMINATIM_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            session_max_age_days: parse_session_days(env::var("SESSION_MAX_AGE_DAYS").ok()),
            session_signing_key,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            firebase_project_id: "bici-registro-test".to_string(),
            site_url: "http://localhost:3000".to_string(),
            port: 8080,
            nominatim_url: "http://127.0.0.1:9".to_string(),
            session_max_age_days: DEFAULT_SESSION_DAYS,
            session_signing_key: b"test_session_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Whether cookies should carry the `Secure` flag.
    ///
    /// Only plain-http localhost development runs without it.
    pub fn secure_cookies(&self) -> bool {
        !(self.site_url.starts_with("http://localhost")
            || self.site_url.starts_with("http://127.0.0.1"))
    }
}

fn parse_session_days(raw: Option<String>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_SESSION_DAYS)
        .clamp(MIN_SESSION_DAYS, MAX_SESSION_DAYS)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
