//! # Trellis Axum
//!
//! Binds the Trellis [`Context`](trellis_core::Context) contract and
//! [`Route`](trellis_core::Route) descriptors onto an [`axum::Router`].
//!
//! - [`AxumAdapter`] - Registers routes, translating `{name}` paths to `:name`
//! - [`AxumContext`] - The [`Context`](trellis_core::Context) handed to handlers
//! - [`serve`] / [`run`] - Serve a router with peer addresses and graceful shutdown
//!
//! # Example
//!
//! ```rust,ignore
//! use http::Method;
//! use trellis_axum::{serve, shutdown_on_signal, AxumAdapter};
//! use trellis_core::{Operation, Route};
//!
//! let mut adapter = AxumAdapter::new();
//! adapter.add_route(Route::typed(Method::GET, "/items/{id}", get_item, Some(Operation::new("getItem"))))?;
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! serve(listener, adapter.into_router(), shutdown_on_signal()).await?;
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-axum/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod adapter;
mod config;
mod context;
mod error;
mod path;
mod server;

pub use adapter::AxumAdapter;
pub use config::AdapterConfig;
pub use context::AxumContext;
pub use error::{AdapterError, ServeError};
pub use path::translate_path;
pub use server::{run, serve, shutdown_on_signal};
