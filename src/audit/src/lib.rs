//! # Vaultkeeper Audit Module
//!
//! Append-only, best-effort record of security-relevant actions: sign-in,
//! sign-out, registration and every vault read or mutation.
//!
//! Recording never fails the caller. A write that cannot be persisted is
//! logged and reported back as [`AuditOutcome::Dropped`].

pub mod error;
pub mod models;
pub mod recorder;
pub mod storage;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::{AuditError, Result};
pub use models::{AuditAction, AuditLog, NewAuditEntry, RequestContext, UserId};
pub use recorder::{AuditOutcome, AuditRecorder};
pub use storage::{AuditStore, InMemoryAuditStore};

#[cfg(feature = "postgres")]
pub use postgres::PostgresAuditStore;
