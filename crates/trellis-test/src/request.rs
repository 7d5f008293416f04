//! Test request building.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use trellis_core::TlsInfo;

use crate::error::TestError;

/// Builder for an in-memory request.
///
/// Invalid input (a bad header, a value that fails to serialize) is recorded
/// and reported by [`build`](Self::build), so calls can be chained freely.
///
/// # Example
///
/// ```
/// use trellis_test::TestRequest;
///
/// let request = TestRequest::get("/items/42?expand=owner")
///     .header("x-request-source", "test")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.uri().query(), Some("expand=owner"));
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequest {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    tls: Option<TlsInfo>,
    error: Option<TestError>,
}

impl TestRequest {
    /// Creates a request with an arbitrary method.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            remote_addr: None,
            tls: None,
            error: None,
        }
    }

    /// Creates a GET request.
    pub fn get(uri: impl AsRef<str>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Creates a POST request.
    pub fn post(uri: impl AsRef<str>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Creates a PUT request.
    pub fn put(uri: impl AsRef<str>) -> Self {
        Self::new(Method::PUT, uri)
    }

    /// Creates a PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> Self {
        Self::new(Method::PATCH, uri)
    }

    /// Creates a DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Appends a header. Repeated calls with the same name send several values.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            (Err(e), _) => self.fail(TestError::InvalidHeader(e.to_string())),
            (_, Err(e)) => self.fail(TestError::InvalidHeader(e.to_string())),
        }
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.headers.remove(header::CONTENT_TYPE);
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.fail(e.into()),
        }
        self.content_type("application/json")
    }

    /// Sets a form-urlencoded body.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Bytes::from(encoded),
            Err(e) => self.fail(e.into()),
        }
        self.content_type("application/x-www-form-urlencoded")
    }

    /// Attaches a peer address, as `into_make_service_with_connect_info` would.
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Marks the request as received over TLS.
    pub fn tls(mut self, tls: TlsInfo) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Builds the HTTP request.
    ///
    /// # Errors
    ///
    /// Returns the first recorded builder error, or
    /// [`TestError::RequestBuild`] if the URI is invalid.
    pub fn build(self) -> Result<http::Request<Body>, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.uri.as_str())
            .body(Body::from(self.body))
            .map_err(|e| TestError::RequestBuild(format!("invalid request {:?}: {e}", self.uri)))?;

        *request.headers_mut() = self.headers;
        if let Some(addr) = self.remote_addr {
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        if let Some(tls) = self.tls {
            request.extensions_mut().insert(tls);
        }
        Ok(request)
    }

    fn fail(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_methods_and_uri() {
        let request = TestRequest::delete("/items/7").build().unwrap();
        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.uri().path(), "/items/7");
    }

    #[test]
    fn test_headers_append() {
        let request = TestRequest::get("/")
            .header("x-tag", "a")
            .header("x-tag", "b")
            .build()
            .unwrap();
        let values: Vec<_> = request.headers().get_all("x-tag").iter().collect();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_json_body() {
        let request = TestRequest::post("/items")
            .json(&json!({"name": "widget"}))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_form_body() {
        let request = TestRequest::post("/login")
            .form(&[("user", "ada"), ("remember", "true")])
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn test_invalid_header_is_reported() {
        let err = TestRequest::get("/")
            .header("bad header", "value")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_invalid_uri_is_reported() {
        let err = TestRequest::get("http://[::1").build().unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }

    #[test]
    fn test_extensions() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let request = TestRequest::get("/")
            .remote_addr(addr)
            .tls(TlsInfo::new().with_protocol_version("TLSv1.3"))
            .build()
            .unwrap();

        assert_eq!(
            request.extensions().get::<ConnectInfo<SocketAddr>>().map(|c| c.0),
            Some(addr)
        );
        assert!(request.extensions().get::<TlsInfo>().is_some());
    }
}
