use axum::http::StatusCode;
use axum_derive_error::ErrorResponse;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, ErrorResponse)]
pub enum ApiError {
    #[error("Query must not be empty.")]
    #[status(StatusCode::BAD_REQUEST)]
    EmptyQuery,

    #[error(transparent)]
    ServerError(#[from] anyhow::Error),
}

impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string() && self.status_code() == other.status_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_a_bad_request() {
        assert_eq!(ApiError::EmptyQuery.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn server_errors_compare_by_message() {
        let left = ApiError::ServerError(anyhow::anyhow!("boom"));
        let right = ApiError::ServerError(anyhow::anyhow!("boom"));

        assert!(left == right);
        assert!(left != ApiError::EmptyQuery);
    }
}
