//! BreadDuty error types.

use thiserror::Error;

/// Result alias used across all BreadDuty crates.
pub type Result<T> = std::result::Result<T, Error>;

/// All error kinds the service surfaces.
///
/// `Transport` failures are logged by the outbox worker and deliberately do
/// not block a duty date from being marked notified — the reminder pipeline
/// is at-most-one-attempt by design.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or inconsistent input (bad date, incompatible duty days).
    #[error("validation error: {0}")]
    Validation(String),

    /// A uniqueness rule was violated (duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unknown user or duty-date id.
    #[error("not found: {0}")]
    NotFound(String),

    /// SMTP send failure.
    #[error("mail transport error: {0}")]
    Transport(String),

    /// Storage failure. Aborts any enclosing transaction.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration load/parse failure.
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
