use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Query, State,
    },
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use panel_pixels::RGB565_FORMAT_TAG;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{ServerConfig, TranscodeParams};
use crate::services::{PackedOutput, Transcoder};

pub const X_WIDTH: HeaderName = HeaderName::from_static("x-width");
pub const X_HEIGHT: HeaderName = HeaderName::from_static("x-height");
pub const X_FORMAT: HeaderName = HeaderName::from_static("x-format");

/// Multipart body of `/optimize`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// The image to transcode (PNG, JPEG, GIF, BMP, WebP or TIFF)
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// Transcode an uploaded image for a fixed-size panel
///
/// Decodes the first uploaded file, optionally applies its EXIF rotation,
/// fits it into `w` x `h`, optionally keys near-white pixels to transparent
/// and returns PNG, JPEG or raw little-endian RGB565.
///
/// Out-of-range or unparseable query values fall back to their defaults or
/// are clamped; they never fail the request.
#[utoipa::path(
    post,
    path = "/optimize",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    params(
        ("w" = Option<u32>, Query, description = "Target width, 1-4096 (default 800)"),
        ("h" = Option<u32>, Query, description = "Target height, 1-4096 (default 480)"),
        ("fit" = Option<String>, Query, description = "cover | contain | fill | inside | outside (default contain)"),
        ("fmt" = Option<String>, Query, description = "png | jpeg | rgb565 (default png)"),
        ("q" = Option<u8>, Query, description = "JPEG quality, 1-100 (default 80)"),
        ("bg" = Option<String>, Query, description = "Padding color as 6 hex digits (default 000000)"),
        ("rotate" = Option<String>, Query, description = "1 to apply EXIF orientation (default on)"),
        ("alpha" = Option<String>, Query, description = "1 to keep transparency (PNG only)"),
        ("strip" = Option<String>, Query, description = "white to key near-white pixels (needs alpha=1)"),
        ("strip_tol" = Option<u8>, Query, description = "Keying tolerance, 1-120 (default 24)"),
    ),
    responses(
        (status = 200, description = "Transcoded image: image/png, image/jpeg, or for fmt=rgb565 an application/octet-stream buffer with X-Width, X-Height and X-Format headers", content_type = "image/png"),
        (status = 400, description = "Missing file or malformed multipart body", body = crate::error::ErrorResponse),
        (status = 413, description = "Upload exceeds the size limit", body = crate::error::ErrorResponse),
        (status = 500, description = "Decode, resize or encode failed", body = crate::error::ErrorResponse),
    ),
    tag = "Transcode"
)]
pub async fn handle_optimize(
    State(transcoder): State<Arc<Transcoder>>,
    State(config): State<Arc<ServerConfig>>,
    Query(query): Query<HashMap<String, String>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    // Parameters are resolved before the body is read
    let params = TranscodeParams::resolve(&query);
    tracing::debug!(?params, "Resolved transcode parameters");

    let multipart = multipart.map_err(|e| ApiError::MalformedMultipart(e.body_text()))?;
    let upload = read_upload(multipart, config.max_upload_bytes).await?;

    tracing::debug!(bytes = upload.len(), "Received upload");

    let output = tokio::task::spawn_blocking(move || transcoder.transcode(&upload, &params))
        .await
        .map_err(|e| ApiError::Internal(format!("Transcode task failed: {e}")))??;

    Ok(into_http_response(output))
}

/// Read the first file field, enforcing `limit` while streaming.
///
/// Fields without a filename are skipped.
async fn read_upload(mut multipart: Multipart, limit: usize) -> Result<Vec<u8>, ApiError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.file_name().is_none() {
            continue;
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
            if data.len() + chunk.len() > limit {
                return Err(ApiError::UploadTooLarge { limit });
            }
            data.extend_from_slice(&chunk);
        }
        return Ok(data);
    }

    Err(ApiError::MissingUpload)
}

fn multipart_error(error: MultipartError, limit: usize) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::UploadTooLarge { limit }
    } else {
        ApiError::MalformedMultipart(error.body_text())
    }
}

fn into_http_response(output: PackedOutput) -> Response {
    let content_type = output.content_type();
    let cache_control = output.cache_control();

    let dimensions = match &output {
        PackedOutput::Rgb565 { width, height, .. } => Some((*width, *height)),
        _ => None,
    };

    let body = output.into_bytes();
    let content_length = body.len();
    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control),
        ],
        body,
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));

    if let Some((width, height)) = dimensions {
        let headers = response.headers_mut();
        headers.insert(X_WIDTH, HeaderValue::from(width));
        headers.insert(X_HEIGHT, HeaderValue::from(height));
        headers.insert(X_FORMAT, HeaderValue::from_static(RGB565_FORMAT_TAG));
    }

    response
}
