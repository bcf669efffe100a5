//! Shared error taxonomy.
//!
//! Every tier returns these typed outcomes; the web layer owns the mapping
//! to HTTP statuses (404 / 409 / 400 / 401 / 502 / 500). Messages are
//! user-facing and travel verbatim into the `{success:false, msg}` envelope.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing target or parent record.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation on create.
    #[error("{0}")]
    Conflict(String),

    /// Missing required field, disallowed file type, oversize payload.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid, or expired bearer token on a protected route.
    #[error("{0}")]
    Unauthorized(String),

    /// Object-storage call failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Datastore call failed.
    #[error("database error: {0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(what: &str) -> Self {
        Error::NotFound(format!("{what} not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message() {
        let err = Error::not_found("Subject");
        assert_eq!(err.to_string(), "Subject not found");
    }
}
