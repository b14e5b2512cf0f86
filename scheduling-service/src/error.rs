use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use shared::responses::ApiResponse;
use thiserror::Error;

use crate::domain::compliance::ComplianceReport;

// Scheduling Service Error
#[derive(Debug, Error)]
pub enum SchedulingServiceError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Precondition Failed: {0}")]
    PreconditionFailed(String),

    #[error("Schedule has compliance violations")]
    ComplianceViolated(ComplianceReport),

    #[error("Schedule has compliance warnings; retry with force=true to override")]
    ComplianceWarning(ComplianceReport),

    #[error("No feasible schedule exists: {0}")]
    Infeasible(String),

    #[error("Solve timed out: {0}")]
    TimedOut(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Workforce Service Error: {0}")]
    WorkforceService(String),

    #[error("Workforce Service unavailable: {0}")]
    WorkforceServiceUnavailable(String),

    #[error("Circuit breaker is open - workforce service unavailable")]
    CircuitOpen,
}

impl SchedulingServiceError {
    /// Turns a unique-constraint breach into `Conflict`, leaving every other
    /// database failure as `Database`.
    pub fn from_db(e: sqlx::Error, conflict_msg: &str) -> Self {
        if let sqlx::Error::Database(ref db) = e
            && db.is_unique_violation()
        {
            return Self::Conflict(conflict_msg.to_string());
        }
        Self::Database(e)
    }
}

impl IntoResponse for SchedulingServiceError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::PreconditionFailed(_) => StatusCode::CONFLICT,
            Self::ComplianceViolated(_) | Self::Infeasible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ComplianceWarning(_) => StatusCode::CONFLICT,
            Self::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::WorkforceService(_) | Self::WorkforceServiceUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, %status, "Server error");
        } else {
            tracing::warn!(error = %self, %status, "Client error");
        }

        // Compliance outcomes carry the full finding list so callers can
        // render violations and decide whether to force.
        match self {
            Self::ComplianceViolated(report) | Self::ComplianceWarning(report) => {
                let body = ApiResponse {
                    success: false,
                    data: Some(report),
                    error: Some(message),
                };
                (status, axum::Json(body)).into_response()
            }
            Self::Database(_) => {
                let body = ApiResponse::<()>::err(
                    "Something went wrong while accessing the database.",
                );
                (status, axum::Json(body)).into_response()
            }
            _ => {
                let body = ApiResponse::<()>::err(message);
                (status, axum::Json(body)).into_response()
            }
        }
    }
}
