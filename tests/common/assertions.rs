//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status,
        expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert response is a valid PNG image
pub fn assert_png(response: &TestResponse) {
    assert_ok(response);
    assert!(
        response.is_png(),
        "Expected PNG image, got {} bytes starting with {:?}",
        response.body.len(),
        &response.body[..8.min(response.body.len())]
    );
    assert_eq!(
        response.header("content-type"),
        Some("image/png"),
        "Expected Content-Type: image/png"
    );
}

/// Assert response is a valid JPEG image
pub fn assert_jpeg(response: &TestResponse) {
    assert_ok(response);
    assert!(response.is_jpeg(), "Expected JPEG image");
    assert_eq!(response.header("content-type"), Some("image/jpeg"));
}

/// Assert an error response with the given status and `error` message
pub fn assert_error(response: &TestResponse, status: StatusCode, message: &str) {
    assert_status(response, status);
    let json: serde_json::Value = response.json();
    assert_eq!(
        json["error"].as_str(),
        Some(message),
        "Unexpected error body: {}",
        response.text()
    );
}

/// Assert that an encoded image is immutable-cacheable
pub fn assert_immutable_cache(response: &TestResponse) {
    assert_eq!(
        response.header("cache-control"),
        Some("public, max-age=31536000, immutable")
    );
}

/// Assert channel values are within one step of each other
pub fn assert_pixel_near(actual: &[u8], expected: &[u8]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            a.abs_diff(*e) <= 1,
            "pixel {actual:?} differs from {expected:?}"
        );
    }
}
