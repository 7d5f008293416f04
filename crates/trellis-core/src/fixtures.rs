//! Test fixtures.
//!
//! [`MockContext`] is an in-memory [`Context`] for exercising handlers
//! without an HTTP engine.
//!
//! # Example
//!
//! ```
//! use futures_util::FutureExt;
//! use http::{Method, StatusCode};
//! use trellis_core::fixtures::MockContext;
//! use trellis_core::{handler_fn, Context, Route};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let route = Route::new(
//!     Method::GET,
//!     "/items/{id}",
//!     handler_fn(|ctx| {
//!         async move {
//!             let id = ctx.request_param("id").to_string();
//!             ctx.response_body().write_bytes(id.as_bytes());
//!         }
//!         .boxed()
//!     }),
//! );
//!
//! let mut ctx = MockContext::new(route.clone()).with_param("id", "42");
//! route.call(&mut ctx).await;
//!
//! assert_eq!(ctx.response_status(), Some(StatusCode::OK));
//! assert_eq!(ctx.response().body(), b"42");
//! # });
//! ```

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode, Uri};

use crate::body::RequestBody;
use crate::context::RequestContext;
use crate::contract::Context;
use crate::error::ParseError;
use crate::headers::{self, HeaderPairs};
use crate::multipart::MultipartForm;
use crate::params::{LazyQuery, Params};
use crate::response::ResponseWriter;
use crate::route::Route;
use crate::tls::TlsInfo;

/// In-memory [`Context`] implementation.
#[derive(Debug)]
pub struct MockContext {
    route: Route,
    scope: RequestContext,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: Params,
    query: LazyQuery,
    remote_address: Option<SocketAddr>,
    tls: Option<TlsInfo>,
    body: RequestBody,
    form: Option<MultipartForm>,
    response: ResponseWriter,
}

impl MockContext {
    /// Creates a context for `route` with the route's method, an empty
    /// body and the target `/`.
    pub fn new(route: Route) -> Self {
        let scope = match route.operation_id() {
            Some(id) => RequestContext::new().with_operation_id(id),
            None => RequestContext::new(),
        };
        Self {
            method: route.method().clone(),
            route,
            scope,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            params: Params::new(),
            query: LazyQuery::new(None),
            remote_address: None,
            tls: None,
            body: RequestBody::empty(),
            form: None,
            response: ResponseWriter::new(),
        }
    }

    /// Sets the request method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request target, including its query string.
    #[must_use]
    pub fn with_uri(mut self, uri: Uri) -> Self {
        self.query = LazyQuery::new(uri.query());
        self.uri = uri;
        self
    }

    /// Appends a request header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Adds a matched path parameter.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.push(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::from_bytes(body);
        self
    }

    /// Sets the peer address.
    #[must_use]
    pub fn with_remote_address(mut self, addr: SocketAddr) -> Self {
        self.remote_address = Some(addr);
        self
    }

    /// Marks the request as arriving over TLS.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsInfo) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Replaces the request scope.
    #[must_use]
    pub fn with_request_context(mut self, scope: RequestContext) -> Self {
        self.scope = scope;
        self
    }

    /// Returns the response written so far.
    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    /// Consumes the context, returning the response.
    pub fn into_response(self) -> ResponseWriter {
        self.response
    }
}

#[async_trait]
impl Context for MockContext {
    fn route(&self) -> &Route {
        &self.route
    }

    fn request_context(&self) -> &RequestContext {
        &self.scope
    }

    fn request_method(&self) -> &Method {
        &self.method
    }

    fn request_host(&self) -> &str {
        headers::request_host(&self.headers, &self.uri)
    }

    fn remote_address(&self) -> Option<SocketAddr> {
        self.remote_address
    }

    fn request_url(&self) -> &Uri {
        &self.uri
    }

    fn request_params(&self) -> &Params {
        &self.params
    }

    fn request_query_params(&self) -> &Params {
        self.query.params()
    }

    fn request_header(&self, name: &str) -> &str {
        headers::header_str(&self.headers, name)
    }

    fn request_headers(&self) -> HeaderPairs<'_> {
        HeaderPairs::new(&self.headers)
    }

    fn request_tls(&self) -> Option<&TlsInfo> {
        self.tls.as_ref()
    }

    fn request_body(&mut self) -> &mut RequestBody {
        &mut self.body
    }

    async fn request_multipart_form(
        &mut self,
        max_memory: u64,
    ) -> Result<&MultipartForm, ParseError> {
        if self.form.is_none() {
            let content_type = headers::header_str(&self.headers, CONTENT_TYPE.as_str()).to_owned();
            let form = MultipartForm::parse(&content_type, &mut self.body, max_memory).await?;
            self.form = Some(form);
        }
        self.form.as_ref().ok_or(ParseError::BodyClosed)
    }

    fn response_status(&self) -> Option<StatusCode> {
        self.response.status()
    }

    fn response_header(&self, name: &str) -> &str {
        self.response.header(name)
    }

    fn response_body(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::multipart::tests::{content_type, create_multipart_body};
    use futures_util::FutureExt;

    fn route() -> Route {
        Route::new(Method::GET, "/items/{id}", handler_fn(|_ctx| async {}.boxed()))
    }

    #[test]
    fn test_absent_values_are_empty() {
        let ctx = MockContext::new(route());
        assert_eq!(ctx.request_param("id"), "");
        assert_eq!(ctx.request_query("page"), "");
        assert_eq!(ctx.request_header("x-request-id"), "");
        assert_eq!(ctx.request_host(), "");
        assert!(ctx.remote_address().is_none());
        assert!(ctx.request_tls().is_none());
        assert_eq!(ctx.response_status(), None);
    }

    #[test]
    fn test_request_reads() {
        let addr: SocketAddr = "10.0.0.7:51000".parse().unwrap();
        let ctx = MockContext::new(route())
            .with_uri(Uri::from_static("/items/42?page=2&page=3"))
            .with_param("id", "42")
            .with_header(http::header::HOST, HeaderValue::from_static("api.local"))
            .with_remote_address(addr)
            .with_tls(TlsInfo::new().with_protocol_version("TLSv1.3"));

        assert_eq!(ctx.request_method(), Method::GET);
        assert_eq!(ctx.request_url().path(), "/items/42");
        assert_eq!(ctx.request_param("id"), "42");
        assert_eq!(ctx.request_query("page"), "2");
        assert_eq!(ctx.request_host(), "api.local");
        assert_eq!(ctx.remote_address(), Some(addr));
        assert_eq!(
            ctx.request_tls().and_then(|tls| tls.protocol_version.as_deref()),
            Some("TLSv1.3")
        );
        assert_eq!(ctx.route().path(), "/items/{id}");
    }

    #[test]
    fn test_response_headers_set_and_append() {
        let mut ctx = MockContext::new(route());
        let tag = HeaderName::from_static("x-tag");

        ctx.set_response_header(tag.clone(), HeaderValue::from_static("one"));
        ctx.set_response_header(tag.clone(), HeaderValue::from_static("two"));
        assert_eq!(ctx.response_header("x-tag"), "two");

        ctx.append_response_header(tag, HeaderValue::from_static("three"));
        let values: Vec<_> = ctx
            .response()
            .header_pairs()
            .filter(|(name, _)| *name == "x-tag")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(values, vec!["two", "three"]);
    }

    #[test]
    fn test_status_committed_once_last_set_reported() {
        let mut ctx = MockContext::new(route());
        ctx.set_response_status(StatusCode::CREATED);
        ctx.set_response_status(StatusCode::OK);
        assert_eq!(ctx.response_status(), Some(StatusCode::OK));
        assert_eq!(ctx.response().committed_status(), Some(StatusCode::CREATED));

        let (status, _, _) = ctx.into_response().into_parts();
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_multipart_is_cached() {
        let raw = create_multipart_body(&[("name", None, "text/plain", b"ada")]);
        let mut ctx = MockContext::new(route())
            .with_header(CONTENT_TYPE, HeaderValue::from_str(&content_type()).unwrap())
            .with_body(raw);

        let first = ctx.request_multipart_form(1024).await.unwrap().clone();
        let second = ctx.request_multipart_form(1).await.unwrap();

        assert_eq!(first.value("name"), "ada");
        assert_eq!(&first, second);
    }

    #[tokio::test]
    async fn test_multipart_over_limit_is_parse_error() {
        let big = vec![b'z'; 2048];
        let raw = create_multipart_body(&[("notes", None, "text/plain", &big)]);
        let mut ctx = MockContext::new(route())
            .with_header(CONTENT_TYPE, HeaderValue::from_str(&content_type()).unwrap())
            .with_body(raw);

        let err = ctx.request_multipart_form(512).await.unwrap_err();
        assert!(matches!(err, ParseError::TooLarge { limit: 512 }));
    }

    #[tokio::test]
    async fn test_request_body_close() {
        let mut ctx = MockContext::new(route()).with_body("payload");
        ctx.request_body().close();
        assert!(ctx.request_body().is_closed());
        assert!(matches!(
            ctx.request_multipart_form(1024).await,
            Err(ParseError::NotMultipart { .. })
        ));
    }
}
