// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.
//!
//! Field names are camelCase to match the documents the web client writes.

pub mod bike;
pub mod emergency;
pub mod ong;
pub mod stats;
pub mod user;

pub use bike::{Bike, BikeStatus, TheftReport};
pub use emergency::{EmergencyAccessLog, EmergencyContact, EmergencyProfile};
pub use ong::{Campaign, CampaignStatus, Event, OngProfile};
pub use stats::GlobalStats;
pub use user::{Role, User};
