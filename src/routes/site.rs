// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Web-app artifacts: service workers, PWA manifest and sitemap.

use crate::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

const SERVICE_WORKER_JS: &str = include_str!("../../static/sw.js");
const MESSAGING_WORKER_JS: &str = include_str!("../../static/firebase-messaging-sw.js");

/// Worker scripts need to run script; the default API policy forbids it.
const WORKER_CSP: &str = "default-src 'self'; script-src 'self' https://www.gstatic.com; connect-src *";

/// Public pages listed in the sitemap: (path, change frequency, priority).
const PUBLIC_PAGES: &[(&str, &str, &str)] = &[
    ("/", "weekly", "1.0"),
    ("/registro", "monthly", "0.8"),
    ("/buscar", "weekly", "0.9"),
    ("/ongs", "weekly", "0.7"),
    ("/eventos", "daily", "0.7"),
    ("/emergencia", "monthly", "0.5"),
    ("/login", "yearly", "0.4"),
    ("/privacidad", "yearly", "0.3"),
    ("/terminos", "yearly", "0.3"),
];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sw.js", get(service_worker))
        .route("/firebase-messaging-sw.js", get(messaging_worker))
        .route("/manifest.webmanifest", get(manifest))
        .route("/sitemap.xml", get(sitemap))
}

fn worker_response(body: &'static str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONTENT_SECURITY_POLICY, WORKER_CSP),
        ],
        body,
    )
        .into_response()
}

async fn service_worker() -> Response {
    worker_response(SERVICE_WORKER_JS)
}

async fn messaging_worker() -> Response {
    worker_response(MESSAGING_WORKER_JS)
}

async fn manifest() -> Response {
    let manifest = serde_json::json!({
        "name": "BiciRegistro",
        "short_name": "BiciRegistro",
        "description": "Registro nacional de bicicletas contra el robo",
        "start_url": "/",
        "scope": "/",
        "display": "standalone",
        "background_color": "#ffffff",
        "theme_color": "#0f766e",
        "lang": "es-MX",
        "icons": [
            { "src": "/icons/icon-192.png", "sizes": "192x192", "type": "image/png" },
            { "src": "/icons/icon-512.png", "sizes": "512x512", "type": "image/png" },
            { "src": "/icons/icon-512-maskable.png", "sizes": "512x512", "type": "image/png", "purpose": "maskable" }
        ]
    });

    (
        [(header::CONTENT_TYPE, "application/manifest+json")],
        Json(manifest),
    )
        .into_response()
}

async fn sitemap(State(state): State<Arc<AppState>>) -> Response {
    let body = render_sitemap(&state.config.site_url, &crate::time_utils::now_rfc3339());
    ([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], body).into_response()
}

/// Render the sitemap XML for `site_url`.
pub fn render_sitemap(site_url: &str, lastmod: &str) -> String {
    let base = xml_escape(site_url.trim_end_matches('/'));
    let lastmod = xml_escape(lastmod);

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for (path, changefreq, priority) in PUBLIC_PAGES {
        xml.push_str(&format!(
            "  <url>\n    <loc>{base}{path}</loc>\n    <lastmod>{lastmod}</lastmod>\n    \
             <changefreq>{changefreq}</changefreq>\n    <priority>{priority}</priority>\n  </url>\n"
        ));
    }

    xml.push_str("</urlset>\n");
    xml
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
