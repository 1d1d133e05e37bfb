use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use panel_pixels::SurfaceError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    MissingUpload,

    #[error("Bad multipart upload")]
    MalformedMultipart(String),

    #[error("File too large")]
    UploadTooLarge { limit: usize },

    #[error("Optimization failed")]
    Transcode(#[from] TranscodeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUpload | ApiError::MalformedMultipart(_) => StatusCode::BAD_REQUEST,
            ApiError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Transcode(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Extra context for the `detail` field of the error body.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::MissingUpload => None,
            ApiError::MalformedMultipart(detail) => Some(detail.clone()),
            ApiError::UploadTooLarge { limit } => Some(format!("limit is {limit} bytes")),
            ApiError::Transcode(e) => Some(e.to_string()),
            ApiError::Internal(_) => None,
        }
    }
}

/// Errors from the transcode pipeline.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("resize error: {0}")]
    Resize(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(&'static str),

    #[error("pixel buffer error: {0}")]
    Surface(#[from] SurfaceError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Short error description
    pub error: String,
    /// Underlying cause, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, detail = ?self.detail(), "Request failed");
        } else {
            tracing::warn!(error = %self, detail = ?self.detail(), "Request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            detail: self.detail(),
        });

        (status, body).into_response()
    }
}
