use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::types::ErrorResponse;
use crate::error::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// API错误类型
#[derive(Debug)]
pub struct AppError(pub Error);

impl AppError {
    /// 客户端错误返回 4xx，未就绪返回 503，其余为 500
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::ServiceNotReady | Error::EmptyStore => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidImage(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse { error: self.0.kind().to_string(), message: self.0.to_string() };
        (self.status(), Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
