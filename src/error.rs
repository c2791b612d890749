//! Error taxonomy shared by every core module.
//!
//! Six categories: caller faults ([`Error::Validation`], [`Error::NotFound`],
//! [`Error::Conflict`], [`Error::Structural`]) are deterministic and never
//! retried; [`Error::StoreUnavailable`] is transient and safe to retry with
//! backoff; [`Error::IndexDrift`] reports a secondary-index step that failed
//! after a successful primary commit — the entity is durable, the index is
//! stale until repaired via `index::reindex`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input. Caller's fault, never retried.
    #[error("validation: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Unique-key collision or optimistic version mismatch.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Content-tree invariant violated. Names the offending block(s).
    #[error("structural violation: {0}")]
    Structural(String),

    /// Transient store connectivity or contention failure. Retryable.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Secondary index could not be updated after a successful primary
    /// commit. Reported, not fatal; resolvable via reindex.
    #[error("index drift for {entity_id}: {reason}")]
    IndexDrift { entity_id: String, reason: String },
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    pub fn drift(entity_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IndexDrift {
            entity_id: entity_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether a caller may retry the operation with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// Map SQLite failures onto the taxonomy: constraint violations are
/// conflicts; everything else (busy, locked, cannot-open, I/O) surfaces as
/// a store failure with its message intact.
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ffi::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                Error::Conflict(err.to_string())
            }
            _ => Error::StoreUnavailable(err.to_string()),
        }
    }
}
