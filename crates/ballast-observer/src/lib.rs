//! Read-only observer for a Ballast zone.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **HTML counter sign** (`GET /`) showing the item count against the
//!   limit, the danger level and the pool balance
//! - **REST endpoints** for zone status, player standing, shops and shelves
//! - **`WebSocket` endpoint** (`/ws/events`) streaming every zone
//!   notification as it is published
//! - **Runner status** (`GET /api/operator/status`)
//!
//! # Architecture
//!
//! Handlers hold an `Arc` of the live [`Zone`](ballast_core::zone::Zone)
//! and call its query methods, which take the same short-lived locks as
//! player actions. Nothing in this crate mutates the zone.

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
