//! [`Context`] implementation over an axum request.

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{Method, StatusCode, Uri};
use trellis_core::{
    header_str, request_host, Context, HeaderPairs, LazyQuery, MultipartForm, Params, ParseError,
    RequestBody, RequestContext, ResponseWriter, Route, TlsInfo,
};

/// The per-request context handed to route handlers by [`AxumAdapter`].
///
/// Owns the request head, the unread body and the writer that streams the
/// response back to the dispatch callback. It lives on the handler task for
/// one dispatch.
///
/// [`AxumAdapter`]: crate::AxumAdapter
#[derive(Debug)]
pub struct AxumContext {
    route: Route,
    scope: RequestContext,
    parts: Parts,
    params: Params,
    query: LazyQuery,
    body: RequestBody,
    form: Option<MultipartForm>,
    response: ResponseWriter,
}

impl AxumContext {
    pub(crate) fn new(
        route: Route,
        scope: RequestContext,
        parts: Parts,
        params: Params,
        body: RequestBody,
        response: ResponseWriter,
    ) -> Self {
        let query = LazyQuery::new(parts.uri.query());
        Self {
            route,
            scope,
            parts,
            params,
            query,
            body,
            form: None,
            response,
        }
    }
}

#[async_trait]
impl Context for AxumContext {
    fn route(&self) -> &Route {
        &self.route
    }

    fn request_context(&self) -> &RequestContext {
        &self.scope
    }

    fn request_method(&self) -> &Method {
        &self.parts.method
    }

    fn request_host(&self) -> &str {
        request_host(&self.parts.headers, &self.parts.uri)
    }

    fn remote_address(&self) -> Option<SocketAddr> {
        self.parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr)
    }

    fn request_url(&self) -> &Uri {
        &self.parts.uri
    }

    fn request_params(&self) -> &Params {
        &self.params
    }

    fn request_query_params(&self) -> &Params {
        self.query.params()
    }

    fn request_header(&self, name: &str) -> &str {
        header_str(&self.parts.headers, name)
    }

    fn request_headers(&self) -> HeaderPairs<'_> {
        HeaderPairs::new(&self.parts.headers)
    }

    fn request_tls(&self) -> Option<&TlsInfo> {
        self.parts.extensions.get::<TlsInfo>()
    }

    fn request_body(&mut self) -> &mut RequestBody {
        &mut self.body
    }

    async fn request_multipart_form(
        &mut self,
        max_memory: u64,
    ) -> Result<&MultipartForm, ParseError> {
        if self.form.is_none() {
            let content_type = header_str(&self.parts.headers, CONTENT_TYPE.as_str()).to_owned();
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
