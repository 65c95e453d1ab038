use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use eqsolve::errors::SolveError;
use std::net::AddrParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid server address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Errors returned by route handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Solve(#[from] SolveError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad Request").into_response(),
            // Callers only ever see the generic message, whatever went wrong
            AppError::Solve(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "An error occurred").into_response()
            }
        }
    }
}
