use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure of a component operation.
///
/// Component endpoints render these with [`ServiceError::status_code`]; the remote
/// client maps the status back, so the kind survives a process boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    UpstreamFailure(String),
    #[error("{0}")]
    SchemaMismatch(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    NotImplemented(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::UpstreamFailure(_) | ServiceError::SchemaMismatch(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

impl From<client::Error> for ServiceError {
    fn from(err: client::Error) -> Self {
        let message = err.body().map(str::to_string).unwrap_or_else(|| err.to_string());
        match err.status() {
            Some(StatusCode::BAD_REQUEST) => ServiceError::InvalidInput(message),
            Some(StatusCode::SERVICE_UNAVAILABLE) => ServiceError::Unavailable(message),
            Some(StatusCode::NOT_IMPLEMENTED) => ServiceError::NotImplemented(message),
            _ => ServiceError::UpstreamFailure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_kind() {
        assert_eq!(
            ServiceError::InvalidInput("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::SchemaMismatch("shape".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::Unavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServiceError::NotImplemented("no".into()).status_code(),
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn remote_statuses_map_back_to_kinds() {
        let remote = |status: StatusCode| client::Error::Status {
            url: "http://ratings/ratings/1".to_string(),
            status,
            body: "service unavailable".to_string(),
        };

        assert_eq!(
            ServiceError::from(remote(StatusCode::SERVICE_UNAVAILABLE)),
            ServiceError::Unavailable("service unavailable".to_string())
        );
        assert!(matches!(
            ServiceError::from(remote(StatusCode::BAD_GATEWAY)),
            ServiceError::UpstreamFailure(_)
        ));
    }
}
