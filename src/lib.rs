// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! BiciRegistro: bicycle registration and anti-theft platform API.
//!
//! This crate provides the backend for session handling, serial-number
//! checks, public bike lookups, emergency QR profiles, ONG dashboards and
//! the small proxies the web client relies on.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{FirebaseTokenVerifier, ImageProxy, NominatimClient};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub token_verifier: Arc<FirebaseTokenVerifier>,
    pub nominatim: NominatimClient,
    pub image_proxy: ImageProxy,
}
