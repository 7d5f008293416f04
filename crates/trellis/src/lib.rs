//! # Trellis
//!
//! **Framework-agnostic HTTP handlers with an axum binding**
//!
//! Application code talks to a [`Context`](core::Context), a small
//! capability interface over one HTTP exchange, or writes typed handlers
//! that never see HTTP at all. Routes are described once with brace-syntax
//! paths (`/items/{id}`) and handed to an engine binding for registration.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::prelude::*;
//!
//! #[derive(Default, Deserialize)]
//! struct GetItem { id: u64 }
//!
//! #[derive(Serialize)]
//! struct Item { id: u64 }
//!
//! async fn get_item(_ctx: RequestContext, req: GetItem) -> Result<Item, HandlerError> {
//!     Ok(Item { id: req.id })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env_prefix("TRELLIS").load()?;
//!     init_logging(&LogConfig::from(&config.logging))?;
//!
//!     let mut adapter = AxumAdapter::from_config(&config);
//!     adapter.add_route(Route::typed(
//!         Method::GET,
//!         "/items/{id}",
//!         get_item,
//!         Some(Operation::new("getItem")),
//!     ))?;
//!
//!     run(adapter.into_router(), &config.server, shutdown_on_signal()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! ```text
//! trellis-core       Context, Route, typed handlers, codecs, errors
//! trellis-axum       AxumAdapter, AxumContext, serve/run
//! trellis-config     TrellisConfig, ConfigLoader
//! trellis-telemetry  init_logging
//! ```

#![doc(html_root_url = "https://docs.rs/trellis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the context contract and route types
pub use trellis_core as core;

// Re-export the axum binding
pub use trellis_axum as axum;

// Re-export configuration
pub use trellis_config as config;

// Re-export logging setup
pub use trellis_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use trellis_core::{
        handler_fn, Context, HandlerError, HandlerFunc, HandlerResult, JsonCodec, Operation,
        RequestContext, RequestId, Route,
    };

    pub use http::{Method, StatusCode};

    pub use trellis_axum::{run, serve, shutdown_on_signal, AdapterConfig, AxumAdapter};

    pub use trellis_config::{ConfigLoader, TrellisConfig};

    pub use trellis_telemetry::{init_logging, LogConfig};

    pub use serde::{Deserialize, Serialize};
}
