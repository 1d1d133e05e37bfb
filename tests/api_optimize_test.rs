//! Integration tests for the /optimize endpoint.

mod common;

use axum::http::StatusCode;
use common::fixtures::{self, Part};
use common::*;
use panelpress::models::ServerConfig;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_contain_png_pads_with_black_borders() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(1000, 1000, [255, 255, 255]);

    let response = app
        .post_file("/optimize?w=800&h=480&fit=contain&fmt=png", "photo.png", &upload)
        .await;

    assert_png(&response);
    assert_immutable_cache(&response);

    let image = response.image().into_rgb8();
    assert_eq!(image.dimensions(), (800, 480));
    // 480x480 content centered with 160px borders either side
    assert_eq!(image.get_pixel(0, 240).0, [0, 0, 0]);
    assert_eq!(image.get_pixel(799, 240).0, [0, 0, 0]);
    assert_pixel_near(&image.get_pixel(400, 240).0, &[255, 255, 255]);
}

#[tokio::test]
async fn test_defaults_produce_800x480_png() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(40, 40, [10, 200, 30]);

    let response = app.post_file("/optimize", "a.png", &upload).await;

    assert_png(&response);
    assert_eq!(response.image().into_rgb8().dimensions(), (800, 480));
}

#[tokio::test]
async fn test_rgb565_output() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(1000, 1000, [255, 255, 255]);

    let response = app
        .post_file("/optimize?w=800&h=480&fit=contain&fmt=rgb565", "photo.png", &upload)
        .await;

    assert_ok(&response);
    assert_eq!(response.bytes().len(), 768_000);
    assert_eq!(
        response.header("content-type"),
        Some("application/octet-stream")
    );
    assert_eq!(response.header("x-width"), Some("800"));
    assert_eq!(response.header("x-height"), Some("480"));
    assert_eq!(response.header("x-format"), Some("RGB565LE"));
    assert_eq!(response.header("cache-control"), Some("no-store"));
    assert_eq!(response.header("content-length"), Some("768000"));

    // Row 240: black border, then white content
    let row = 240 * 800 * 2;
    assert_eq!(&response.bytes()[row..row + 2], &[0x00, 0x00]);
    let center = row + 400 * 2;
    assert_eq!(&response.bytes()[center..center + 2], &[0xFF, 0xFF]);
}

#[tokio::test]
async fn test_cover_extreme_aspect_upload_fills_panel() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(1, 4096, [0, 0, 255]);

    let response = app
        .post_file("/optimize?fit=cover&fmt=rgb565", "strip.png", &upload)
        .await;

    assert_ok(&response);
    assert_eq!(response.bytes().len(), 768_000);
    assert_eq!(&response.bytes()[..2], &[0x1F, 0x00]);
}

#[tokio::test]
async fn test_outside_fit_too_large_is_500() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(1, 4096, [0, 0, 255]);

    let response = app
        .post_file("/optimize?fit=outside&fmt=rgb565", "strip.png", &upload)
        .await;

    assert_error(
        &response,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Optimization failed",
    );
    let json: serde_json::Value = response.json();
    assert!(json["detail"]
        .as_str()
        .is_some_and(|d| d.starts_with("resize error")));
}

#[tokio::test]
async fn test_truncated_png_upload_is_recovered() {
    let app = TestApp::new();
    let png = fixtures::pattern_png(64, 64);
    let upload = &png[..png.len() * 9 / 10];

    let response = app
        .post_file("/optimize?w=64&h=64&fmt=rgb565", "cut.png", upload)
        .await;

    assert_ok(&response);
    assert_eq!(response.bytes().len(), 64 * 64 * 2);
}

#[tokio::test]
async fn test_display_p3_upload_is_converted_to_srgb() {
    let app = TestApp::new();
    let icc = moxcms::ColorProfile::new_display_p3().encode().unwrap();
    let upload = fixtures::icc_tagged_jpeg(16, 16, [200, 100, 50], &icc);

    let response = app
        .post_file("/optimize?w=16&h=16", "p3.jpg", &upload)
        .await;

    assert_png(&response);
    let pixel = response.image().into_rgb8().get_pixel(8, 8).0;
    for (actual, expected) in pixel.iter().zip([215u8, 93, 31]) {
        assert!(actual.abs_diff(expected) <= 6, "{pixel:?} is not sRGB");
    }
}

#[tokio::test]
async fn test_rgb565_uses_background_color() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(10, 10, [0, 0, 0]);

    let response = app
        .post_file("/optimize?w=20&h=10&fmt=rgb565&bg=FF0000", "a.png", &upload)
        .await;

    assert_ok(&response);
    assert_eq!(response.bytes().len(), 20 * 10 * 2);
    // Pure red padding packs to 0xF800
    assert_eq!(&response.bytes()[..2], &[0x00, 0xF8]);
}

#[tokio::test]
async fn test_out_of_range_params_are_clamped_not_rejected() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(8, 8, [50, 60, 70]);

    let response = app
        .post_file("/optimize?w=99999&h=3&q=500&fit=bogus&fmt=rgb565", "a.png", &upload)
        .await;

    assert_ok(&response);
    assert_eq!(response.header("x-width"), Some("4096"));
    assert_eq!(response.header("x-height"), Some("3"));
    assert_eq!(response.bytes().len(), 4096 * 3 * 2);
}

#[tokio::test]
async fn test_unknown_format_falls_back_to_png() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(8, 8, [1, 2, 3]);

    let response = app
        .post_file("/optimize?w=8&h=8&fmt=webp", "a.png", &upload)
        .await;

    assert_png(&response);
}

#[tokio::test]
async fn test_jpeg_output() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(64, 64, [200, 40, 40]);

    let response = app
        .post_file("/optimize?w=32&h=32&fmt=jpeg&q=90", "a.png", &upload)
        .await;

    assert_jpeg(&response);
    assert_immutable_cache(&response);
    assert_eq!(response.image().into_rgb8().dimensions(), (32, 32));
}

#[tokio::test]
async fn test_jpeg_input_accepted() {
    let app = TestApp::new();
    let upload = fixtures::solid_jpeg(50, 30, [90, 90, 90]);

    let response = app
        .post_file("/optimize?w=25&h=15&fit=fill", "a.jpg", &upload)
        .await;

    assert_png(&response);
    assert_eq!(response.image().into_rgb8().dimensions(), (25, 15));
}

#[tokio::test]
async fn test_inside_does_not_upscale() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(100, 50, [0, 0, 255]);

    let response = app
        .post_file("/optimize?w=800&h=480&fit=inside", "a.png", &upload)
        .await;

    assert_png(&response);
    assert_eq!(response.image().into_rgb8().dimensions(), (100, 50));
}

#[tokio::test]
async fn test_alpha_padding_is_transparent() {
    let app = TestApp::new();
    let upload = fixtures::solid_png(10, 10, [0, 128, 0]);

    let response = app
        .post_file("/optimize?w=20&h=10&alpha=1", "a.png", &upload)
        .await;

    assert_png(&response);
    let image = response.image();
    assert!(image.color().has_alpha());
    let image = image.into_rgba8();
    assert_eq!(image.get_pixel(0, 5).0[3], 0);
    assert_eq!(image.get_pixel(10, 5).0, [0, 128, 0, 255]);
}

#[tokio::test]
async fn test_alpha_without_png_is_dropped() {
    let app = TestApp::new();
    let upload = fixtures::solid_rgba_png(8, 8, [10, 20, 30, 0]);

    let response = app
        .post_file("/optimize?w=8&h=8&alpha=1&fmt=jpeg", "a.png", &upload)
        .await;

    assert_jpeg(&response);
    assert!(!response.image().color().has_alpha());
}

#[tokio::test]
async fn test_strip_white_keys_background() {
    let app = TestApp::new();
    let upload = fixtures::split_png(20, 10, [200, 0, 0]);

    let response = app
        .post_file(
            "/optimize?w=20&h=10&fit=fill&alpha=1&strip=white&strip_tol=24",
            "logo.png",
            &upload,
        )
        .await;

    assert_png(&response);
    let image = response.image().into_rgba8();
    assert_eq!(image.get_pixel(2, 5).0[3], 0, "white half should be keyed");
    assert_eq!(image.get_pixel(17, 5).0[3], 255, "red half should stay");
}

#[tokio::test]
async fn test_strip_white_requires_alpha() {
    let app = TestApp::new();
    let upload = fixtures::split_png(20, 10, [200, 0, 0]);

    let response = app
        .post_file("/optimize?w=20&h=10&fit=fill&strip=white", "logo.png", &upload)
        .await;

    assert_png(&response);
    assert!(!response.image().color().has_alpha());
}

#[tokio::test]
async fn test_first_file_field_is_used() {
    let app = TestApp::new();
    let first = fixtures::solid_png(8, 8, [255, 0, 0]);
    let second = fixtures::solid_png(8, 8, [0, 0, 255]);

    let response = app
        .post_multipart(
            "/optimize?w=8&h=8&fmt=rgb565",
            &[
                Part::Text {
                    name: "note",
                    value: "ignored",
                },
                Part::File {
                    name: "image",
                    filename: "red.png",
                    data: &first,
                },
                Part::File {
                    name: "file",
                    filename: "blue.png",
                    data: &second,
                },
            ],
        )
        .await;

    assert_ok(&response);
    assert_eq!(&response.bytes()[..2], &[0x00, 0xF8]);
}

#[tokio::test]
async fn test_missing_file_is_400() {
    let app = TestApp::new();

    let response = app
        .post_multipart(
            "/optimize",
            &[Part::Text {
                name: "file",
                value: "not a file",
            }],
        )
        .await;

    assert_error(&response, StatusCode::BAD_REQUEST, "No file uploaded");
}

#[tokio::test]
async fn test_non_multipart_body_is_400() {
    let app = TestApp::new();

    let response = app
        .post_raw("/optimize", "application/json", b"{}".to_vec())
        .await;

    assert_error(&response, StatusCode::BAD_REQUEST, "Bad multipart upload");
    let json: serde_json::Value = response.json();
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn test_multipart_without_boundary_is_400() {
    let app = TestApp::new();

    let response = app
        .post_raw("/optimize", "multipart/form-data", b"--x\r\n".to_vec())
        .await;

    assert_error(&response, StatusCode::BAD_REQUEST, "Bad multipart upload");
}

#[tokio::test]
async fn test_truncated_multipart_is_400() {
    let app = TestApp::new();
    let body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n\r\nabc",
        fixtures::BOUNDARY
    );

    let response = app
        .post_raw(
            "/optimize",
            &format!("multipart/form-data; boundary={}", fixtures::BOUNDARY),
            body.into_bytes(),
        )
        .await;

    assert_error(&response, StatusCode::BAD_REQUEST, "Bad multipart upload");
}

#[tokio::test]
async fn test_corrupt_image_is_500() {
    let app = TestApp::new();

    let response = app
        .post_file("/optimize", "broken.png", &fixtures::corrupt_png())
        .await;

    assert_error(
        &response,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Optimization failed",
    );
    let json: serde_json::Value = response.json();
    assert!(json["detail"]
        .as_str()
        .is_some_and(|d| d.starts_with("decode error")));
}

#[tokio::test]
async fn test_empty_file_is_500() {
    let app = TestApp::new();

    let response = app.post_file("/optimize", "empty.png", &[]).await;

    assert_error(
        &response,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Optimization failed",
    );
}

#[tokio::test]
async fn test_oversized_upload_is_413() {
    let app = TestApp::with_config(ServerConfig {
        max_upload_bytes: 1024,
        ..TestApp::test_config()
    });
    // Not an image: rejected on size before any decode
    let upload = vec![0u8; app.config.max_upload_bytes * 4];

    let response = app.post_file("/optimize", "big.bin", &upload).await;

    assert_error(&response, StatusCode::PAYLOAD_TOO_LARGE, "File too large");
}

#[tokio::test]
async fn test_upload_at_limit_is_accepted() {
    let upload = fixtures::solid_png(4, 4, [1, 1, 1]);
    let app = TestApp::with_config(ServerConfig {
        max_upload_bytes: upload.len(),
        ..TestApp::test_config()
    });

    let response = app.post_file("/optimize?w=4&h=4", "a.png", &upload).await;

    assert_png(&response);
}

#[tokio::test]
async fn test_default_limit_rejects_over_20_mib() {
    let app = TestApp::new();
    let upload = vec![0u8; 20 * 1024 * 1024 + 1];

    let response = app.post_file("/optimize", "huge.bin", &upload).await;

    assert_error(&response, StatusCode::PAYLOAD_TOO_LARGE, "File too large");
}

#[tokio::test]
async fn test_identical_requests_give_identical_bytes() {
    let app = TestApp::new();
    let upload = fixtures::split_png(30, 20, [0, 90, 180]);

    let first = app
        .post_file("/optimize?w=15&h=10&fmt=png", "a.png", &upload)
        .await;
    let second = app
        .post_file("/optimize?w=15&h=10&fmt=png", "a.png", &upload)
        .await;

    assert_png(&first);
    assert_eq!(first.bytes(), second.bytes());
}

#[tokio::test]
async fn test_get_optimize_is_not_allowed() {
    let app = TestApp::new();

    let response = app.get("/optimize").await;

    assert_status(&response, StatusCode::METHOD_NOT_ALLOWED);
}
