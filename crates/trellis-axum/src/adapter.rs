//! Route registration and request dispatch.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{FromRequestParts, RawPathParams, Request};
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter};
use axum::Router;
use futures_util::StreamExt;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use tokio_util::sync::CancellationToken;
use trellis_config::TrellisConfig;
use trellis_core::{
    Codec, Context, HandlerError, JsonCodec, Params, RequestBody, RequestContext, ResponseWriter,
    Route,
};

use crate::config::AdapterConfig;
use crate::context::AxumContext;
use crate::error::AdapterError;
use crate::path::translate_path;

/// Registers [`Route`]s with an [`axum::Router`].
///
/// Each route's brace-syntax path is translated to axum syntax and its
/// handler is wrapped in a dispatch callback. The callback runs the handler
/// on its own task and streams the response: the status line and headers
/// reach the client as soon as the handler sets a status or writes body
/// bytes. The callback always produces a response.
///
/// # Example
///
/// ```
/// use futures_util::FutureExt;
/// use http::Method;
/// use trellis_axum::AxumAdapter;
/// use trellis_core::{handler_fn, Context, Route};
///
/// let mut adapter = AxumAdapter::new();
/// adapter
///     .add_route(Route::new(
///         Method::GET,
///         "/items/{id}",
///         handler_fn(|ctx| {
///             async move {
///                 let id = ctx.request_param("id").to_string();
///                 ctx.response_body().write_bytes(id.as_bytes());
///             }
///             .boxed()
///         }),
///     ))
///     .unwrap();
///
/// let router: axum::Router = adapter.into_router();
/// # let _ = router;
/// ```
pub struct AxumAdapter {
    router: Router,
    config: AdapterConfig,
    routes: Vec<Route>,
    // Mirrors the paths given to axum so conflicts surface as errors
    // instead of router panics.
    shadow: matchit::Router<()>,
    registered: HashMap<String, Vec<Method>>,
}

impl AxumAdapter {
    /// Creates an adapter over an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::with_router(Router::new(), AdapterConfig::default())
    }

    /// Creates an adapter over an empty router with the given settings.
    #[must_use]
    pub fn with_config(config: AdapterConfig) -> Self {
        Self::with_router(Router::new(), config)
    }

    /// Creates an adapter from the application configuration.
    #[must_use]
    pub fn from_config(config: &TrellisConfig) -> Self {
        Self::with_config(AdapterConfig::from(config))
    }

    /// Creates an adapter that registers onto an existing router.
    ///
    /// Conflicts with routes already present in `router` are not detected.
    #[must_use]
    pub fn with_router(router: Router, config: AdapterConfig) -> Self {
        Self {
            router,
            config,
            routes: Vec::new(),
            shadow: matchit::Router::new(),
            registered: HashMap::new(),
        }
    }

    /// Registers a route.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::InvalidPath`] if the path cannot be translated
    /// - [`AdapterError::UnsupportedMethod`] if axum cannot route the method
    /// - [`AdapterError::Conflict`] if the path overlaps a registered one
    ///   in a way the router cannot tell apart
    pub fn add_route(&mut self, route: Route) -> Result<(), AdapterError> {
        let native = translate_path(route.path())?;
        let filter = MethodFilter::try_from(route.method().clone()).map_err(|_| {
            AdapterError::UnsupportedMethod {
                method: route.method().clone(),
            }
        })?;
        self.reserve(&native, route.method())?;

        tracing::debug!(
            method = %route.method(),
            path = route.path(),
            native_path = %native,
            operation_id = route.operation_id().unwrap_or(""),
            "registering route"
        );

        let config = self.config.clone();
        let target = route.clone();
        let handler = move |request: Request| dispatch(target.clone(), config.clone(), request);
        self.router = std::mem::take(&mut self.router).route(&native, on(filter, handler));
        self.routes.push(route);
        Ok(())
    }

    /// Registers several routes, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error [`add_route`](Self::add_route) reports.
    pub fn add_routes(&mut self, routes: impl IntoIterator<Item = Route>) -> Result<(), AdapterError> {
        routes.into_iter().try_for_each(|route| self.add_route(route))
    }

    /// Returns the routes registered so far.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the adapter settings.
    pub const fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Returns the underlying router.
    pub const fn router(&self) -> &Router {
        &self.router
    }

    /// Consumes the adapter, returning the router for serving.
    pub fn into_router(self) -> Router {
        self.router
    }

    fn reserve(&mut self, native: &str, method: &Method) -> Result<(), AdapterError> {
        let conflict = |existing: String| AdapterError::Conflict {
            method: method.clone(),
            path: native.to_owned(),
            existing,
        };

        if let Some(methods) = self.registered.get_mut(native) {
            if methods.contains(method) {
                return Err(conflict(native.to_owned()));
            }
            methods.push(method.clone());
            return Ok(());
        }

        self.shadow.insert(native, ()).map_err(|err| match err {
            matchit::InsertError::Conflict { with } => conflict(with),
            other => AdapterError::invalid_path(native, other.to_string()),
        })?;
        self.registered.insert(native.to_owned(), vec![method.clone()]);
        Ok(())
    }
}

impl Default for AxumAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AxumAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AxumAdapter")
            .field("config", &self.config)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

async fn dispatch(route: Route, config: AdapterConfig, request: Request) -> Response {
    let (mut parts, body) = request.into_parts();
    let params: Params = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(raw) => raw
            .iter()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect(),
        Err(rejection) => {
            tracing::debug!(
                method = %parts.method,
                path = parts.uri.path(),
                route = route.path(),
                error = %rejection,
                "path parameters rejected"
            );
            return rejection.into_response();
        }
    };

    // Cancels the scope once the client is done with this exchange: when the
    // engine drops this future before the head is ready, or drops the body.
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();

    let mut scope = RequestContext::new().with_cancellation(token);
    if let Some(operation_id) = route.operation_id() {
        scope = scope.with_operation_id(operation_id);
    }
    if let Some(timeout) = config.request_timeout {
        scope = scope.with_timeout(timeout);
    }
    let request_id = scope.request_id();

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = parts.uri.path(),
        route = route.path(),
        "dispatching request"
    );

    let mut body = RequestBody::new(body);
    if let Some(limit) = config.max_body_bytes {
        body = body.with_limit(limit);
    }
    let (writer, mut output) = ResponseWriter::channel();
    let ctx = AxumContext::new(route.clone(), scope, parts, params, body, writer);
    tokio::spawn(run_handler(route, config.request_timeout, ctx));

    let Some(head) = output.head().await else {
        tracing::error!(request_id = %request_id, "handler task ended without a response");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let (head, ()) = head.into_parts();
    let body = output.into_body_stream().map(move |chunk| {
        let _cancel_on_drop = &guard;
        chunk
    });
    Response::from_parts(head, Body::from_stream(body))
}

enum Outcome {
    Completed,
    TimedOut(Duration),
    Abandoned,
}

async fn run_handler(route: Route, timeout: Option<Duration>, mut ctx: AxumContext) {
    let scope = ctx.request_context().clone();
    let request_id = scope.request_id();

    let outcome = tokio::select! {
        () = scope.cancelled() => Outcome::Abandoned,
        outcome = call_with_timeout(&route, &mut ctx, timeout) => outcome,
    };

    match outcome {
        Outcome::Completed => {}
        Outcome::TimedOut(limit) => {
            scope.cancel();
            tracing::warn!(
                request_id = %request_id,
                route = route.path(),
                timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                "request timed out"
            );
            if !ctx.response_body().is_committed() {
                write_timeout(&mut ctx);
            }
        }
        Outcome::Abandoned => {
            tracing::debug!(
                request_id = %request_id,
                route = route.path(),
                "client went away, handler abandoned"
            );
            return;
        }
    }

    let status = ctx.response_body().finish();
    tracing::debug!(
        request_id = %request_id,
        status = status.as_u16(),
        duration_ms = u64::try_from(scope.elapsed().as_millis()).unwrap_or(u64::MAX),
        "request completed"
    );
}

async fn call_with_timeout(
    route: &Route,
    ctx: &mut AxumContext,
    timeout: Option<Duration>,
) -> Outcome {
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, route.call(ctx)).await {
            Ok(()) => Outcome::Completed,
            Err(_) => Outcome::TimedOut(limit),
        },
        None => {
            route.call(ctx).await;
            Outcome::Completed
        }
    }
}

fn write_timeout(ctx: &mut AxumContext) {
    let error = HandlerError::timeout("request handler exceeded its time limit");
    let envelope = error
        .to_envelope()
        .with_request_id(ctx.request_context().request_id().to_string())
        .with_operation_id(ctx.route().operation_id());

    let body = JsonCodec::new().encode(&envelope).ok();
    if body.is_some() {
        ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    ctx.set_response_status(error.status_code());
    if let Some(body) = body {
        ctx.response_body().write_bytes(&body);
    }
}
