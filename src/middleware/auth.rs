// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie authentication middleware.

use crate::config::SESSION_COOKIE_NAME;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::services::session::decode_session_token;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Authenticated user, loaded from Firestore by the session middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
}

/// Middleware that requires a valid session.
///
/// The session is read from the `__session` cookie, falling back to a
/// `Bearer` header for non-browser clients. A session whose user record has
/// been deleted is answered with `StaleSession`, which also clears the cookie.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token.to_string(),
            None => return Err(AppError::Unauthorized),
        }
    };

    let claims = decode_session_token(&token, &state.config.session_signing_key)?;

    let user = state.db.get_user(&claims.sub).await?.ok_or_else(|| {
        tracing::warn!(uid = %claims.sub, "Session refers to a missing user record");
        AppError::StaleSession {
            secure_cookies: state.config.secure_cookies(),
        }
    })?;

    request.extensions_mut().insert(CurrentUser { user });

    Ok(next.run(request).await)
}

/// Check that the current user holds one of `allowed` roles.
pub fn require_role(current: &CurrentUser, allowed: &[Role]) -> Result<(), AppError> {
    if current.user.has_role(allowed) {
        Ok(())
    } else {
        tracing::warn!(
            uid = %current.user.uid,
            role = ?current.user.role,
            "Blocked request: insufficient role"
        );
        Err(AppError::Forbidden("Insufficient role".to_string()))
    }
}
