//! # BreadDuty Mailer
//!
//! Async SMTP sending (lettre) behind a [`MailTransport`] trait, and the
//! [`Outbox`] — a queue-fed background worker so callers never block on
//! delivery. Send outcomes are published on a broadcast channel; a transient
//! failure is logged, not propagated.

pub mod outbox;
pub mod smtp;

pub use outbox::{DispatchOutcome, Outbox, OutboundMail};
pub use smtp::{MailTransport, NullTransport, SmtpMailer};
