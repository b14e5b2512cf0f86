use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform envelope for every API response in the workspace.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error_msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error_msg.into()),
        }
    }
}

/// Alias for handlers that acknowledge without returning data.
pub type EmptyApiResponse = ApiResponse<()>;

/// Liveness payload for the `/healthz` endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub service: &'static str,
    pub status: &'static str,
}

impl HealthResponse {
    pub fn up(service: &'static str) -> Self {
        Self {
            service,
            status: "up",
        }
    }
}
