// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod firebase_auth;
pub mod image_proxy;
pub mod nominatim;
pub mod session;

pub use firebase_auth::{AuthError, FirebaseTokenVerifier, VerifiedFirebaseUser};
pub use image_proxy::ImageProxy;
pub use nominatim::NominatimClient;
