use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every failure a request can end in. Rendered as `{"error": "<message>"}`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The body could not populate the expected shape, or the entity rejected it.
    #[error("{0}")]
    InvalidInput(String),

    #[error("not found")]
    NotFound,

    /// The store failed; carries the store's text unless it is being withheld.
    #[error("{0}")]
    StoreFailure(String),

    /// A handler panicked.
    #[error("internal server error")]
    Unhandled,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::StoreFailure(_) | ApiError::Unhandled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_status_codes() {
        assert_eq!(
            ApiError::InvalidInput("bad".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::StoreFailure("pool timed out".to_owned()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Unhandled.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn message_is_the_error_text() {
        assert_eq!(ApiError::NotFound.to_string(), "not found");
        assert_eq!(
            ApiError::StoreFailure("relation \"users\" does not exist".to_owned()).to_string(),
            "relation \"users\" does not exist"
        );
    }
}
