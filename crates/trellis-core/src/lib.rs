//! # Trellis Core
//!
//! Framework-agnostic HTTP contract for Trellis.
//!
//! This crate defines what a handler can see and do, independent of the HTTP
//! engine that serves it:
//!
//! - [`Context`] - Per-request capability interface over one HTTP exchange
//! - [`Route`] / [`Operation`] - Immutable route descriptor and its documentation metadata
//! - [`HandlerFunc`] - The untyped handler shape bindings invoke
//! - [`Route::typed`] - Adapter from typed handlers to [`HandlerFunc`]
//! - [`RequestContext`] - Cancellation-aware request scope handed to typed handlers
//! - [`Codec`] / [`JsonCodec`] - Marshaling policy for typed handlers
//! - [`HandlerError`], [`DecodeError`], [`ParseError`] - Error taxonomy
//!
//! Engine bindings (such as `trellis-axum`) implement [`Context`] and
//! register [`Route`]s with their router.

#![doc(html_root_url = "https://docs.rs/trellis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod codec;
mod context;
mod contract;
mod error;
mod fields;
pub mod fixtures;
mod handler;
mod headers;
mod multipart;
mod params;
mod response;
mod route;
mod tls;

pub use body::{BoxError, RequestBody};
pub use codec::{Codec, DecodeInput, JsonCodec, DEFAULT_BODY_LIMIT};
pub use context::{RequestContext, RequestId};
pub use contract::Context;
pub use error::{
    DecodeError, EncodeError, ErrorCategory, ErrorDetail, ErrorEnvelope, FieldErrors,
    HandlerError, HandlerResult, ParseError,
};
pub use handler::{handler_fn, HandlerFunc};
pub use headers::{header_str, request_host, HeaderPairs};
pub use multipart::{FileHeader, MultipartForm, DEFAULT_MAX_MEMORY};
pub use params::{LazyQuery, Params};
pub use response::{ResponseReceiver, ResponseWriter};
pub use route::{Operation, Route, RouteBuilder};
pub use tls::TlsInfo;

pub use async_trait::async_trait;
pub use futures_util::future::BoxFuture;
