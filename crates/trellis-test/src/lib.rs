//! # Trellis Test
//!
//! In-memory HTTP testing for Trellis services. Requests go through the real
//! [`axum::Router`] built by the binding, so path translation, dispatch and
//! response conversion are all exercised without binding a port.
//!
//! ## Example
//!
//! ```ignore
//! use trellis_axum::AxumAdapter;
//! use trellis_test::TestClient;
//!
//! #[tokio::test]
//! async fn test_get_item() {
//!     let mut adapter = AxumAdapter::new();
//!     adapter.add_route(get_item_route()).unwrap();
//!     let client = TestClient::new(adapter.into_router());
//!
//!     client
//!         .get("/items/42")
//!         .send()
//!         .await
//!         .assert_status(StatusCode::OK)
//!         .assert_json_field("id", &json!(42));
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequest;
pub use response::TestResponse;
