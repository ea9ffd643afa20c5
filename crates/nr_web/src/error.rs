use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nr_core::{Error, ErrorKind};
use serde_json::json;
use tracing::{error, warn};

/// Handler error carrying the domain error it was built from.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Unavailable | ErrorKind::Storage | ErrorKind::Cancelled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorKind::BadUpstream => StatusCode::BAD_GATEWAY,
            ErrorKind::UpstreamRejected(status) => {
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.0.kind() {
            ErrorKind::Unavailable => "News provider unavailable",
            ErrorKind::BadUpstream => "Failed to validate the news response",
            ErrorKind::UpstreamRejected(_) => "News provider rejected the request",
            ErrorKind::InvalidInput => "Invalid request",
            ErrorKind::Storage => "Cache backend unavailable",
            ErrorKind::Cancelled => "Server is shutting down",
            ErrorKind::Internal => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        let body = Json(json!({
            "message": self.message(),
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: Error) -> StatusCode {
        ApiError(error).status()
    }

    #[test]
    fn test_upstream_failures_stay_distinct() {
        assert_eq!(
            status_of(Error::UpstreamUnavailable("refused".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(Error::UpstreamSchema("bad".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(Error::UpstreamStatus {
                status: 429,
                message: "rateLimited".into()
            }),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_other_failures() {
        assert_eq!(status_of(Error::Timeout("fetch".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(Error::InvalidEmbedding("empty".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::Storage("down".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_of(Error::Inference("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(Error::UpstreamStatus {
                status: 42,
                message: "odd".into()
            }),
            StatusCode::BAD_GATEWAY
        );
    }
}
