// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! BiciRegistro API Server
//!
//! Backend for the bicycle registration and anti-theft platform: sessions,
//! serial-number checks, emergency QR profiles and ONG dashboards.

use bici_registro::{
    config::Config,
    db::FirestoreDb,
    services::{FirebaseTokenVerifier, ImageProxy, NominatimClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting BiciRegistro API");

    // Initialize the database
    let db = if std::env::var("BICI_IN_MEMORY_DB").is_ok() {
        tracing::warn!("Using in-memory database; data will not persist");
        FirestoreDb::new_in_memory()
    } else {
        FirestoreDb::new(&config.firebase_project_id).await?
    };

    let token_verifier = Arc::new(FirebaseTokenVerifier::new(&config.firebase_project_id)?);
    let nominatim = NominatimClient::new(&config.nominatim_url)?;
    let image_proxy = ImageProxy::new()?;

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        token_verifier,
        nominatim,
        image_proxy,
    });

    // Build router
    let app = bici_registro::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bici_registro=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
