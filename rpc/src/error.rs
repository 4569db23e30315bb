//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meetpoll_ledger::PollError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Poll(e) => poll_status(e),
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Poll(e) => e.code(),
            Self::InvalidRequest(_) => "invalid_request",
            Self::Internal(_) | Self::Server(_) => "internal_error",
        }
    }
}

fn poll_status(e: &PollError) -> StatusCode {
    match e {
        PollError::PasswordRequired => StatusCode::UNAUTHORIZED,
        PollError::InvalidPassword | PollError::NameTakenNoPassword => StatusCode::FORBIDDEN,
        PollError::SessionNotFound(_) | PollError::NotFound(_) => StatusCode::NOT_FOUND,
        PollError::InvalidTimeslotReference(_)
        | PollError::EmptyVoteSet
        | PollError::InvalidInput(_)
        | PollError::InvalidTimeRange => StatusCode::BAD_REQUEST,
        PollError::DuplicateTimeslot | PollError::DuplicateVote(_) | PollError::HasVotes => {
            StatusCode::CONFLICT
        }
        PollError::Credential(_) | PollError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error,
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
