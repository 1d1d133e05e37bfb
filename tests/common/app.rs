//! Test application factory for integration tests.

use axum::{body::Body, http::Request};
use http_body_util::BodyExt;
use tower::ServiceExt;

use panelpress::models::ServerConfig;
use panelpress::server::{build_router, create_app_state};

use super::fixtures::{multipart_body, Part, BOUNDARY};

/// Test application wrapping the production router
pub struct TestApp {
    router: axum::Router,
    pub config: ServerConfig,
}

impl TestApp {
    /// Create a test application with fast PNG settings
    pub fn new() -> Self {
        Self::with_config(Self::test_config())
    }

    /// Create a test application with a custom configuration
    pub fn with_config(config: ServerConfig) -> Self {
        let state = create_app_state(config.clone());
        let router = build_router(state);
        Self { router, config }
    }

    /// Default configuration with the cheapest oxipng preset
    pub fn test_config() -> ServerConfig {
        ServerConfig {
            png_effort: 0,
            ..ServerConfig::default()
        }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Upload a single file field named `file`
    pub async fn post_file(&self, path: &str, filename: &str, data: &[u8]) -> TestResponse {
        self.post_multipart(
            path,
            &[Part::File {
                name: "file",
                filename,
                data,
            }],
        )
        .await
    }

    /// POST a multipart body built from `parts`
    pub async fn post_multipart(&self, path: &str, parts: &[Part<'_>]) -> TestResponse {
        self.post_multipart_with_headers(path, parts, &[]).await
    }

    /// POST a multipart body with extra request headers
    pub async fn post_multipart_with_headers(
        &self,
        path: &str,
        parts: &[Part<'_>],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::post(path).header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder.body(Body::from(multipart_body(parts))).unwrap())
            .await
    }

    /// POST an arbitrary body with the given content type
    pub async fn post_raw(&self, path: &str, content_type: &str, body: Vec<u8>) -> TestResponse {
        self.request(
            Request::post(path)
                .header("Content-Type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Send an arbitrary request with custom headers and no body
    pub async fn send_with_headers(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Get a header as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }

    /// Check if response is a JPEG image
    pub fn is_jpeg(&self) -> bool {
        self.body.len() >= 3 && self.body[0..3] == [0xFF, 0xD8, 0xFF]
    }

    /// Decode the body as an image
    pub fn image(&self) -> image::DynamicImage {
        image::load_from_memory(&self.body).expect("Failed to decode response image")
    }
}
