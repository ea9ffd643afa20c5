use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Inference error: {0}")]
    Inference(String),

    /// The news provider could not be reached or did not answer in time.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The news provider answered with a non-success status.
    #[error("Upstream returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    /// The news provider answered, but the payload is not a valid article listing.
    #[error("Invalid upstream data: {0}")]
    UpstreamSchema(String),

    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

/// Coarse classification used by callers that need to react to a failure
/// without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unavailable,
    BadUpstream,
    UpstreamRejected(u16),
    InvalidInput,
    Storage,
    Cancelled,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UpstreamUnavailable(_) | Error::Timeout(_) => ErrorKind::Unavailable,
            Error::UpstreamSchema(_) => ErrorKind::BadUpstream,
            Error::UpstreamStatus { status, .. } => ErrorKind::UpstreamRejected(*status),
            Error::InvalidEmbedding(_) | Error::InvalidRequest(_) => ErrorKind::InvalidInput,
            Error::Storage(_) => ErrorKind::Storage,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Io(_) | Error::Serialization(_) | Error::Inference(_) | Error::External(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_failures_stay_distinct() {
        let network = Error::UpstreamUnavailable("connection refused".to_string());
        let schema = Error::UpstreamSchema("missing field `articles`".to_string());
        let status = Error::UpstreamStatus {
            status: 429,
            message: "rateLimited".to_string(),
        };

        assert_eq!(network.kind(), ErrorKind::Unavailable);
        assert_eq!(schema.kind(), ErrorKind::BadUpstream);
        assert_eq!(status.kind(), ErrorKind::UpstreamRejected(429));
    }

    #[test]
    fn test_timeout_counts_as_unavailable() {
        let err = Error::Timeout("fetch top headlines".to_string());
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(!err.is_cancelled());
        assert!(Error::Cancelled.is_cancelled());
    }
}
