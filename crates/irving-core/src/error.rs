use thiserror::Error;

/// Failures surfaced by the profitability engine.
///
/// Collaborator failures ([`SourceError`]) are translated into one of these
/// at the orchestration boundary; raw transport errors never reach callers.
#[derive(Debug, Error)]
pub enum IrvingError {
    /// Caller identity is invalid or could not be re-established. The
    /// consumer should prompt the seller to reconnect their account.
    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    /// A call the computation cannot proceed without has failed. Nothing is
    /// partially returned.
    #[error("Upstream {service} unavailable: {message}")]
    Upstream { service: String, message: String },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },
}

/// Failures reported by the external collaborators (marketplace API, ad
/// insights, config stores).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Credentials rejected outright; refreshing will not help.
    #[error("authorization rejected: {0}")]
    Auth(String),

    /// Access token expired. The engine performs exactly one refresh-and-retry
    /// before giving up.
    #[error("access token expired")]
    TokenExpired,

    /// Transport or service failure.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}
