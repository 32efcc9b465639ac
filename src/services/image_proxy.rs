// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image proxy for user-uploaded pictures.
//!
//! Only Firebase Storage and Google user-content hosts may be proxied, so the
//! endpoint cannot be used as an open relay.

use crate::error::AppError;
use futures_util::StreamExt;
use reqwest::Url;
use std::time::Duration;

const FIREBASE_STORAGE_HOST: &str = "firebasestorage.googleapis.com";
const GOOGLE_USER_CONTENT_HOST: &str = "googleusercontent.com";

/// Upper bound on a proxied image body.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A fetched image.
#[derive(Debug)]
pub struct ProxiedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Parse `raw` and check it points at an allowed host.
///
/// Unparseable input is a `BadRequest`; a well-formed URL to any other host
/// (or over plain http) is `Forbidden`.
pub fn validate_image_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw.trim())
        .map_err(|_| AppError::BadRequest("Invalid 'url' parameter".to_string()))?;

    if url.scheme() != "https" {
        return Err(AppError::Forbidden("Only https URLs may be proxied".to_string()));
    }

    let host = url
        .host_str()
        .ok_or_else(|| AppError::BadRequest("URL has no host".to_string()))?;

    if !is_allowed_host(host) {
        tracing::warn!(host = %host, "Blocked image proxy request to disallowed host");
        return Err(AppError::Forbidden(format!("Host not allowed: {}", host)));
    }

    Ok(url)
}

fn is_allowed_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == FIREBASE_STORAGE_HOST
        || host == GOOGLE_USER_CONTENT_HOST
        || host.ends_with(&format!(".{GOOGLE_USER_CONTENT_HOST}"))
}

/// Fetches whitelisted images.
#[derive(Clone)]
pub struct ImageProxy {
    http: reqwest::Client,
}

impl ImageProxy {
    pub fn new() -> anyhow::Result<Self> {
        // Redirects could leave the whitelist.
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { http })
    }

    /// Fetch `url`, streaming the body and refusing anything over `MAX_IMAGE_BYTES`.
    pub async fn fetch(&self, url: Url) -> Result<ProxiedImage, AppError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Image request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Image host returned status {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        if !content_type.starts_with("image/") && content_type != "application/octet-stream" {
            return Err(AppError::Upstream(format!(
                "Unexpected content type: {}",
                content_type
            )));
        }

        if response
            .content_length()
            .is_some_and(|len| len as usize > MAX_IMAGE_BYTES)
        {
            return Err(AppError::Upstream("Image too large".to_string()));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| AppError::Upstream(format!("Image download failed: {}", e)))?;
            if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(AppError::Upstream("Image too large".to_string()));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(ProxiedImage {
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_hosts() {
        assert!(validate_image_url(
            "https://firebasestorage.googleapis.com/v0/b/app.appspot.com/o/bike.jpg?alt=media"
        )
        .is_ok());
        assert!(validate_image_url("https://lh3.googleusercontent.com/a/photo").is_ok());
        assert!(validate_image_url("https://googleusercontent.com/photo").is_ok());
    }

    #[test]
    fn test_rejected_hosts_are_forbidden() {
        for url in [
            "https://example.com/bike.jpg",
            "https://evilgoogleusercontent.com/x.png",
            "https://googleusercontent.com.evil.io/x.png",
            "https://storage.googleapis.com/bucket/x.png",
            "http://firebasestorage.googleapis.com/v0/b/x",
        ] {
            assert!(
                matches!(validate_image_url(url), Err(AppError::Forbidden(_))),
                "{url} should be forbidden"
            );
        }
    }

    #[test]
    fn test_garbage_is_bad_request() {
        assert!(matches!(
            validate_image_url("not a url"),
            Err(AppError::BadRequest(_))
        ));
    }
}
