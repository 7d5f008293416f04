//! The per-request capability interface.
//!
//! [`Context`] is everything a handler may read from the inbound request and
//! write to the outbound response, with no reference to the HTTP engine that
//! delivered it. Each engine binding provides one implementation.
//!
//! # Absence is not an error
//!
//! Lookups of path parameters, query parameters and headers return `""` for
//! names that were never supplied. Only body reads and multipart parsing can
//! fail, with [`ParseError`].
//!
//! # Lifetime
//!
//! A handler receives `&mut dyn Context` for the duration of one call. The
//! borrow ends when the handler's future completes, so nothing can touch the
//! exchange after the handler returns.

use std::net::SocketAddr;

use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode, Uri};

use crate::body::RequestBody;
use crate::context::RequestContext;
use crate::error::ParseError;
use crate::headers::HeaderPairs;
use crate::multipart::MultipartForm;
use crate::params::Params;
use crate::response::ResponseWriter;
use crate::route::Route;
use crate::tls::TlsInfo;

/// Engine-independent view of one HTTP exchange.
///
/// Exactly one instance exists per in-flight request. It is owned by the
/// binding that created it and is never shared between requests.
#[async_trait]
pub trait Context: Send {
    /// Returns the route that matched this request.
    fn route(&self) -> &Route;

    /// Returns the cancellation-aware request scope.
    fn request_context(&self) -> &RequestContext;

    /// Returns the request method.
    fn request_method(&self) -> &Method;

    /// Returns the requested host, `""` when the client sent none.
    fn request_host(&self) -> &str;

    /// Returns the peer address, when the engine reports one.
    fn remote_address(&self) -> Option<SocketAddr>;

    /// Returns the full request target.
    fn request_url(&self) -> &Uri;

    /// Returns a path parameter, `""` when absent.
    fn request_param(&self, name: &str) -> &str {
        self.request_params().value(name)
    }

    /// Returns every matched path parameter.
    fn request_params(&self) -> &Params;

    /// Returns the first value of a query parameter, `""` when absent.
    fn request_query(&self, name: &str) -> &str {
        self.request_query_params().value(name)
    }

    /// Returns every query parameter, in order.
    fn request_query_params(&self) -> &Params;

    /// Returns the first value of a request header, `""` when absent.
    fn request_header(&self, name: &str) -> &str;

    /// Iterates over request headers, one pair per value.
    fn request_headers(&self) -> HeaderPairs<'_>;

    /// Returns the TLS state, `None` on plaintext connections.
    fn request_tls(&self) -> Option<&TlsInfo>;

    /// Returns the request body stream.
    fn request_body(&mut self) -> &mut RequestBody;

    /// Parses the body as `multipart/form-data`.
    ///
    /// The form is held in memory; bodies over `max_memory` bytes fail with
    /// [`ParseError::TooLarge`]. The first successful result is cached and
    /// returned by later calls regardless of their limit.
    async fn request_multipart_form(
        &mut self,
        max_memory: u64,
    ) -> Result<&MultipartForm, ParseError>;

    /// Sets the response status.
    ///
    /// The first call flushes the status line and the headers set so far to
    /// the transport. Later calls are recorded but never reach the wire.
    fn set_response_status(&mut self, status: StatusCode) {
        self.response_body().set_status(status);
    }

    /// Returns the last status set, `None` if none was set yet.
    fn response_status(&self) -> Option<StatusCode>;

    /// Sets a response header, replacing existing values.
    fn set_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_body().set_header(name, value);
    }

    /// Adds a response header value, keeping existing values.
    fn append_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_body().append_header(name, value);
    }

    /// Returns the first value of a response header, `""` when absent.
    fn response_header(&self, name: &str) -> &str;

    /// Returns the response sink.
    fn response_body(&mut self) -> &mut ResponseWriter;
}
