// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-issued session cookies.
//!
//! Once a Firebase ID token has been verified, the client's credential is
//! replaced by an HS256 JWT carried in the `__session` cookie.

use crate::config::SESSION_COOKIE_NAME;
use crate::error::AppError;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Session JWT claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Subject (Firebase uid)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Create a session token for a Firebase uid.
pub fn create_session_token(
    uid: &str,
    signing_key: &[u8],
    max_age_days: i64,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        sub: uid.to_string(),
        iat: now as usize,
        exp: (now + max_age_days * SECONDS_PER_DAY) as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Decode and validate a session token.
pub fn decode_session_token(token: &str, signing_key: &[u8]) -> Result<SessionClaims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::InvalidToken
    })?;

    if data.claims.sub.is_empty() {
        return Err(AppError::InvalidToken);
    }

    Ok(data.claims)
}

/// Build the session cookie carrying `token`.
pub fn session_cookie(token: String, max_age_days: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(max_age_days))
        .build()
}

/// Build a cookie that clears the session, with the same attributes it was set with.
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie
}
