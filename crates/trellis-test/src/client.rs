//! In-memory test client.

use std::net::SocketAddr;

use axum::Router;
use bytes::Bytes;
use http::Method;
use serde::Serialize;
use tower::ServiceExt;
use trellis_core::TlsInfo;

use crate::error::TestError;
use crate::request::TestRequest;
use crate::response::TestResponse;

/// Drives an [`axum::Router`] without binding a port.
///
/// Each request is sent through a clone of the router with
/// [`ServiceExt::oneshot`], so the full routing and dispatch path runs.
///
/// # Example
///
/// ```
/// use axum::routing::get;
/// use axum::Router;
/// use trellis_test::TestClient;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let client = TestClient::new(Router::new().route("/health", get(|| async { "ok" })));
///
/// let response = client.get("/health").send().await;
/// response.assert_status(http::StatusCode::OK).assert_body_eq("ok");
/// # });
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    router: Router,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for `router`.
    pub fn new(router: Router) -> Self {
        Self {
            router,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with an arbitrary method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let request = self
            .default_headers
            .iter()
            .fold(TestRequest::new(method, uri), |request, (name, value)| {
                request.header(name, value)
            });
        TestClientRequest {
            client: self,
            request,
        }
    }

    /// Sends a prepared request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or the body cannot be read.
    pub async fn execute(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let request = request.build()?;
        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        TestResponse::from_http(response).await
    }
}

/// A request bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    request: TestRequest,
}

impl TestClientRequest<'_> {
    /// Appends a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.request = self.request.header(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.request = self.request.content_type(content_type);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request = self.request.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.request = self.request.json(value);
        self
    }

    /// Sets a form-urlencoded body.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.request = self.request.form(value);
        self
    }

    /// Attaches a peer address.
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.request = self.request.remote_addr(addr);
        self
    }

    /// Marks the request as received over TLS.
    pub fn tls(mut self, tls: TlsInfo) -> Self {
        self.request = self.request.tls(tls);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request is invalid or the response body cannot be read.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request, returning errors instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or the body cannot be read.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        self.client.execute(self.request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Request;
    use axum::routing::{get, post};
    use http::StatusCode;

    fn router() -> Router {
        Router::new()
            .route("/echo-header", get(|request: Request| async move {
                request
                    .headers()
                    .get("x-custom")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("none")
                    .to_string()
            }))
            .route("/items", post(|body: String| async move { (StatusCode::CREATED, body) }))
    }

    #[tokio::test]
    async fn test_default_headers() {
        let client = TestClient::new(router()).with_default_header("x-custom", "default");
        client.get("/echo-header").send().await.assert_body_eq("default");
    }

    #[tokio::test]
    async fn test_post_body() {
        let client = TestClient::new(router());
        let response = client.post("/items").body("widget").send().await;
        response
            .assert_status(StatusCode::CREATED)
            .assert_body_eq("widget");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let client = TestClient::new(router());
        client
            .get("/missing")
            .send()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_request_is_error() {
        let client = TestClient::new(router());
        let result = client.get("/").header("bad header", "x").try_send().await;
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }
}
