//! Common error types used throughout imghost.
//!
//! Library crates funnel their failures into [`Error`]. Callers outside the
//! core translate the variants into whatever their surface needs; nothing here
//! knows about HTTP.

/// Common error type for imghost.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "user", "image").
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A conflicting entity already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credentials were missing or wrong.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Durable storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(entity: &'static str, id: S) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a new Conflict error.
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Unauthorized error.
    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new Storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error is a miss rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("image", "abc123");
        assert_eq!(err.to_string(), "image not found: abc123");

        let err = Error::conflict("username taken");
        assert_eq!(err.to_string(), "Conflict: username taken");

        let err = Error::invalid_input("bad format");
        assert_eq!(err.to_string(), "Invalid input: bad format");

        let err = Error::unauthorized("wrong password");
        assert_eq!(err.to_string(), "Unauthorized: wrong password");

        let err = Error::storage("disk full");
        assert_eq!(err.to_string(), "Storage error: disk full");

        let err = Error::internal("unexpected state");
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::not_found("user", "x").is_not_found());
        assert!(!Error::conflict("x").is_not_found());
    }
}
