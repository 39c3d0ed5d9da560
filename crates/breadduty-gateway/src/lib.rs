//! # BreadDuty Gateway
//!
//! Axum HTTP API over the roster store and the mail outbox. Thin plumbing:
//! validation and scheduling semantics live in the core/store/scheduler
//! crates; this crate maps them onto routes and status codes.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
