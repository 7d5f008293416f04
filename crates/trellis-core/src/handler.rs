//! Untyped handlers and the typed-handler adapter.
//!
//! Bindings only ever see a [`HandlerFunc`]: a function from the opaque
//! [`Context`] to a future. Application code usually writes typed handlers
//! instead, `async fn(RequestContext, Rq) -> Result<Rp, HandlerError>`, and
//! [`Route::typed`](crate::Route::typed) erases them into a `HandlerFunc`
//! here. The generic parameters are fixed at registration time; nothing is
//! inspected at runtime.
//!
//! # Response policy
//!
//! The erased handler owns the response of a typed route:
//!
//! | Outcome | Status | Body |
//! |---|---|---|
//! | success | route success status (200 by default) | encoded response, none for 204/304 |
//! | decode failure | 400, 413 or 415 | [`ErrorEnvelope`] |
//! | handler error | [`ErrorCategory`](crate::ErrorCategory) status | [`ErrorEnvelope`] |
//! | encode failure | 500 | [`ErrorEnvelope`] with code `ENCODE_FAILED` |

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use http::header::{HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Codec, DecodeInput};
use crate::context::RequestContext;
use crate::contract::Context;
use crate::error::{DecodeError, ErrorEnvelope, HandlerError, ParseError};

/// The untyped handler shape every binding invokes.
///
/// The returned future borrows the context, so the handler cannot keep it
/// past its own completion.
pub type HandlerFunc = Arc<dyn for<'a> Fn(&'a mut dyn Context) -> BoxFuture<'a, ()> + Send + Sync>;

/// Wraps a closure as a [`HandlerFunc`].
///
/// # Example
///
/// ```
/// use futures_util::FutureExt;
/// use http::StatusCode;
/// use trellis_core::{handler_fn, HandlerFunc};
///
/// let health: HandlerFunc = handler_fn(|ctx| {
///     async move {
///         ctx.set_response_status(StatusCode::NO_CONTENT);
///     }
///     .boxed()
/// });
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFunc
where
    F: for<'a> Fn(&'a mut dyn Context) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Erases a typed handler into a [`HandlerFunc`].
pub(crate) fn typed_handler<Rq, Rp, F, Fut, C>(
    handler: F,
    codec: C,
    success_status: StatusCode,
) -> HandlerFunc
where
    F: Fn(RequestContext, Rq) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Rp, HandlerError>> + Send + 'static,
    Rq: DeserializeOwned + Default + Send + 'static,
    Rp: Serialize + Send + 'static,
    C: Codec,
{
    let handler = Arc::new(handler);
    let codec = Arc::new(codec);

    handler_fn(move |ctx| {
        let handler = Arc::clone(&handler);
        let codec = Arc::clone(&codec);
        async move {
            let scope = ctx.request_context().clone();

            let request = match decode_request::<Rq, C>(codec.as_ref(), ctx).await {
                Ok(request) => request,
                Err(err) => {
                    tracing::debug!(
                        request_id = %scope.request_id(),
                        error = %err,
                        "request decoding failed"
                    );
                    let status = err.status_code();
                    write_error(ctx, codec.as_ref(), status, err.to_envelope());
                    return;
                }
            };

            match (*handler)(scope.clone(), request).await {
                Ok(response) => write_success(ctx, codec.as_ref(), success_status, &response),
                Err(err) => {
                    if err.status_code().is_server_error() {
                        tracing::error!(
                            request_id = %scope.request_id(),
                            error = %err,
                            "handler failed"
                        );
                    } else {
                        tracing::debug!(
                            request_id = %scope.request_id(),
                            error = %err,
                            "handler rejected request"
                        );
                    }
                    if let HandlerError::RateLimited {
                        retry_after_seconds: Some(seconds),
                        ..
                    } = &err
                    {
                        ctx.set_response_header(RETRY_AFTER, HeaderValue::from(*seconds));
                    }
                    write_error(ctx, codec.as_ref(), err.status_code(), err.to_envelope());
                }
            }
        }
        .boxed()
    })
}

/// Reads the body and builds the typed request value.
async fn decode_request<Rq, C>(codec: &C, ctx: &mut dyn Context) -> Result<Rq, DecodeError>
where
    Rq: DeserializeOwned + Default,
    C: Codec,
{
    let content_type = ctx.request_header(CONTENT_TYPE.as_str()).to_owned();
    let body = ctx
        .request_body()
        .bytes(codec.body_limit())
        .await
        .map_err(|err| match err {
            ParseError::TooLarge { limit } => DecodeError::TooLarge { limit },
            other => DecodeError::Body(other),
        })?;

    codec.decode(&DecodeInput {
        content_type: &content_type,
        body: &body,
        params: ctx.request_params(),
        query: ctx.request_query_params(),
    })
}

fn write_success<C, Rp>(ctx: &mut dyn Context, codec: &C, status: StatusCode, response: &Rp)
where
    C: Codec,
    Rp: Serialize,
{
    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        ctx.set_response_status(status);
        return;
    }

    match codec.encode(response) {
        Ok(body) => {
            set_content_type(ctx, codec);
            ctx.set_response_status(status);
            ctx.response_body().write_bytes(&body);
        }
        Err(err) => {
            tracing::error!(
                request_id = %ctx.request_context().request_id(),
                error = %err,
                "response encoding failed"
            );
            let envelope = ErrorEnvelope::from_code("ENCODE_FAILED", err.to_string());
            write_error(ctx, codec, StatusCode::INTERNAL_SERVER_ERROR, envelope);
        }
    }
}

fn write_error<C: Codec>(
    ctx: &mut dyn Context,
    codec: &C,
    status: StatusCode,
    envelope: ErrorEnvelope,
) {
    let envelope = envelope
        .with_request_id(ctx.request_context().request_id().to_string())
        .with_operation_id(ctx.route().operation_id());

    // Headers go out with the status line, so they are set first.
    let body = match codec.encode(&envelope) {
        Ok(body) => {
            set_content_type(ctx, codec);
            body
        }
        Err(_) => {
            ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            envelope.error.message.into_bytes().into()
        }
    };
    ctx.set_response_status(status);
    ctx.response_body().write_bytes(&body);
}

fn set_content_type<C: Codec>(ctx: &mut dyn Context, codec: &C) {
    if let Ok(value) = HeaderValue::from_str(codec.media_type()) {
        ctx.set_response_header(CONTENT_TYPE, value);
    }
}
