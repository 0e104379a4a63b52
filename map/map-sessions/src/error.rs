//! Error types for the session mapper.

use map_registration::RegistrationError;
use thiserror::Error;

use crate::record::SessionId;

/// Errors returned by [`MultiSessionMapper`](crate::MultiSessionMapper).
///
/// A session that fails to register is not an error; see
/// [`SessionState::Rejected`](crate::SessionState::Rejected).
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session with this id was ever added.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// Registrar setup failed.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Configuration could not be parsed.
    #[error("failed to parse mapper configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for mapper operations.
pub type Result<T> = std::result::Result<T, SessionError>;
