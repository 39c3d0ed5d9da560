//! # BreadDuty Core
//!
//! Shared foundation for the bread-duty roster service: domain types,
//! configuration, the balanced roster planner, and reminder message
//! rendering. Everything here is transport- and storage-agnostic; the
//! gateway, store, and mailer crates build on top of it.

pub mod config;
pub mod error;
pub mod message;
pub mod roster;
pub mod types;

pub use config::BreadDutyConfig;
pub use error::{Error, Result};
pub use roster::{Assignment, plan};
pub use types::{DutyDate, DutyDays, User};
