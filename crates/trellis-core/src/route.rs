//! Route descriptors.
//!
//! A [`Route`] is built once while wiring the application, handed to a
//! binding for registration, and then only read. Clones share one
//! allocation, so every in-flight request can hold the route it matched.

use std::future::Future;
use std::sync::Arc;

use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec::{Codec, JsonCodec};
use crate::context::RequestContext;
use crate::contract::Context;
use crate::error::HandlerError;
use crate::handler::{typed_handler, HandlerFunc};

/// Documentation metadata for a route.
///
/// Used for introspection only; dispatch never looks at it.
///
/// # Example
///
/// ```
/// use trellis_core::Operation;
///
/// let op = Operation::new("getItem")
///     .summary("Fetch one item")
///     .tag("items");
///
/// assert_eq!(op.id, "getItem");
/// assert_eq!(op.tags, vec!["items"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation identifier, e.g. `"getItem"`.
    pub id: String,
    /// Tags for grouping operations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// One-line summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Operation {
    /// Creates operation metadata with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Immutable routing metadata plus the handler that serves it.
///
/// The path uses brace-delimited parameters (`/items/{id}`); bindings
/// translate it into their engine's syntax when registering.
#[derive(Clone)]
pub struct Route {
    inner: Arc<RouteInner>,
}

struct RouteInner {
    method: Method,
    path: String,
    operation: Option<Operation>,
    success_status: StatusCode,
    handler: HandlerFunc,
}

impl Route {
    /// Creates a route from an untyped handler.
    pub fn new(method: Method, path: impl Into<String>, handler: HandlerFunc) -> Self {
        Self::builder(method, path).handler(handler)
    }

    /// Creates a route from a typed handler with the default JSON codec.
    ///
    /// # Example
    ///
    /// ```
    /// use http::Method;
    /// use serde::{Deserialize, Serialize};
    /// use trellis_core::{HandlerError, Operation, RequestContext, Route};
    ///
    /// #[derive(Default, Deserialize)]
    /// struct GetItem {
    ///     id: u64,
    /// }
    ///
    /// #[derive(Serialize)]
    /// struct Item {
    ///     id: u64,
    /// }
    ///
    /// async fn get_item(_ctx: RequestContext, req: GetItem) -> Result<Item, HandlerError> {
    ///     Ok(Item { id: req.id })
    /// }
    ///
    /// let route = Route::typed(Method::GET, "/items/{id}", get_item, Some(Operation::new("getItem")));
    /// assert_eq!(route.path(), "/items/{id}");
    /// assert_eq!(route.operation_id(), Some("getItem"));
    /// ```
    pub fn typed<Rq, Rp, F, Fut>(
        method: Method,
        path: impl Into<String>,
        handler: F,
        operation: Option<Operation>,
    ) -> Self
    where
        F: Fn(RequestContext, Rq) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Rp, HandlerError>> + Send + 'static,
        Rq: DeserializeOwned + Default + Send + 'static,
        Rp: Serialize + Send + 'static,
    {
        let mut builder = Self::builder(method, path);
        builder.operation = operation;
        builder.typed(handler)
    }

    /// Starts building a route.
    pub fn builder(method: Method, path: impl Into<String>) -> RouteBuilder {
        RouteBuilder {
            method,
            path: path.into(),
            operation: None,
            success_status: StatusCode::OK,
            codec: JsonCodec::new(),
        }
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// Returns the path pattern in brace syntax.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Returns the operation metadata, if any.
    pub fn operation(&self) -> Option<&Operation> {
        self.inner.operation.as_ref()
    }

    /// Returns the operation identifier, if any.
    pub fn operation_id(&self) -> Option<&str> {
        self.inner.operation.as_ref().map(|op| op.id.as_str())
    }

    /// Returns the status a typed handler answers with on success.
    pub fn success_status(&self) -> StatusCode {
        self.inner.success_status
    }

    /// Returns the untyped handler.
    pub fn handler(&self) -> &HandlerFunc {
        &self.inner.handler
    }

    /// Runs the handler against `ctx`.
    pub async fn call(&self, ctx: &mut dyn Context) {
        (self.inner.handler)(ctx).await;
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.inner.method)
            .field("path", &self.inner.path)
            .field("operation", &self.inner.operation)
            .field("success_status", &self.inner.success_status)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Route`].
///
/// # Example
///
/// ```
/// use http::{Method, StatusCode};
/// use serde::{Deserialize, Serialize};
/// use trellis_core::{HandlerError, JsonCodec, Operation, RequestContext, Route};
///
/// #[derive(Default, Deserialize)]
/// struct NewItem {
///     name: String,
/// }
///
/// #[derive(Serialize)]
/// struct Created {
///     name: String,
/// }
///
/// let route = Route::builder(Method::POST, "/items")
///     .operation(Operation::new("createItem").tag("items"))
///     .success_status(StatusCode::CREATED)
///     .codec(JsonCodec::new().with_body_limit(64 * 1024))
///     .typed(|_ctx: RequestContext, req: NewItem| async move {
///         Ok::<_, HandlerError>(Created { name: req.name })
///     });
///
/// assert_eq!(route.success_status(), StatusCode::CREATED);
/// ```
#[derive(Debug)]
pub struct RouteBuilder<C = JsonCodec> {
    method: Method,
    path: String,
    operation: Option<Operation>,
    success_status: StatusCode,
    codec: C,
}

impl<C: Codec> RouteBuilder<C> {
    /// Attaches operation metadata.
    #[must_use]
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Sets the status written when a typed handler succeeds (default `200 OK`).
    #[must_use]
    pub fn success_status(mut self, status: StatusCode) -> Self {
        self.success_status = status;
        self
    }

    /// Replaces the marshaling policy for typed handlers.
    pub fn codec<C2: Codec>(self, codec: C2) -> RouteBuilder<C2> {
        RouteBuilder {
            method: self.method,
            path: self.path,
            operation: self.operation,
            success_status: self.success_status,
            codec,
        }
    }

    /// Finishes the route with an untyped handler.
    pub fn handler(self, handler: HandlerFunc) -> Route {
        Route {
            inner: Arc::new(RouteInner {
                method: self.method,
                path: self.path,
                operation: self.operation,
                success_status: self.success_status,
                handler,
            }),
        }
    }

    /// Finishes the route with a typed handler.
    pub fn typed<Rq, Rp, F, Fut>(self, handler: F) -> Route
    where
        F: Fn(RequestContext, Rq) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Rp, HandlerError>> + Send + 'static,
        Rq: DeserializeOwned + Default + Send + 'static,
        Rp: Serialize + Send + 'static,
    {
        let erased = typed_handler(handler, self.codec, self.success_status);
        Route {
            inner: Arc::new(RouteInner {
                method: self.method,
                path: self.path,
                operation: self.operation,
                success_status: self.success_status,
                handler: erased,
            }),
        }
    }
}
