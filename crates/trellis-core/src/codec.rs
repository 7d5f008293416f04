//! Request decoding and response encoding for typed routes.
//!
//! A [`Codec`] turns the raw pieces of a request into the handler's request
//! type and the handler's response type back into bytes. [`JsonCodec`] is the
//! default; routes can be built with any other implementation through
//! [`RouteBuilder::codec`](crate::RouteBuilder::codec).

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DecodeError, EncodeError};
use crate::fields::decode_fields;
use crate::params::Params;

/// Default maximum request body size accepted by [`JsonCodec`] (1 MiB).
pub const DEFAULT_BODY_LIMIT: u64 = 1024 * 1024;

/// Everything a codec may read to build a request value.
#[derive(Debug, Clone, Copy)]
pub struct DecodeInput<'a> {
    /// The request `Content-Type`, `""` when absent.
    pub content_type: &'a str,
    /// The full request body.
    pub body: &'a [u8],
    /// Matched path parameters.
    pub params: &'a Params,
    /// Parsed query parameters.
    pub query: &'a Params,
}

/// Marshaling policy for typed routes.
pub trait Codec: Send + Sync + 'static {
    /// Media type written as `Content-Type` on encoded responses.
    fn media_type(&self) -> &'static str;

    /// Largest request body the codec will read, in bytes.
    fn body_limit(&self) -> u64 {
        DEFAULT_BODY_LIMIT
    }

    /// Builds a request value.
    fn decode<T>(&self, input: &DecodeInput<'_>) -> Result<T, DecodeError>
    where
        T: DeserializeOwned + Default;

    /// Encodes a response value.
    fn encode<T>(&self, value: &T) -> Result<Bytes, EncodeError>
    where
        T: Serialize + ?Sized;
}

/// JSON marshaling.
///
/// Decoding merges three sources into one set of fields:
///
/// 1. a non-empty body, parsed as JSON (the content type must be absent,
///    `application/json`, or an `application/*+json` type);
/// 2. path parameters;
/// 3. query parameters, first occurrence of a repeated name only.
///
/// A name present in an earlier source hides it in later ones. Path and
/// query values are text and are parsed into numbers or booleans when the
/// request type asks for them. A body that is not a JSON object is decoded
/// on its own. A request with no body and no parameters yields
/// `T::default()`.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use trellis_core::{Codec, DecodeInput, JsonCodec, Params};
///
/// #[derive(Debug, Default, Deserialize)]
/// struct GetItem {
///     id: u64,
/// }
///
/// let mut params = Params::new();
/// params.push("id", "42");
/// let query = Params::new();
///
/// let input = DecodeInput { content_type: "", body: b"", params: &params, query: &query };
/// let request: GetItem = JsonCodec::new().decode(&input).unwrap();
/// assert_eq!(request.id, 42);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    body_limit: u64,
}

impl JsonCodec {
    /// Creates a JSON codec with the default body limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Sets the maximum request body size.
    #[must_use]
    pub const fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for JsonCodec {
    fn media_type(&self) -> &'static str {
        "application/json"
    }

    fn body_limit(&self) -> u64 {
        self.body_limit
    }

    fn decode<T>(&self, input: &DecodeInput<'_>) -> Result<T, DecodeError>
    where
        T: DeserializeOwned + Default,
    {
        if !input.body.is_empty() {
            if !input.content_type.is_empty() && !is_json(input.content_type) {
                return Err(DecodeError::UnsupportedMediaType {
                    content_type: input.content_type.to_string(),
                    expected: self.media_type(),
                });
            }
            let body: Value = serde_json::from_slice(input.body)
                .map_err(|err| DecodeError::InvalidBody(err.to_string()))?;
            let result = match body {
                Value::Object(fields) if !(input.params.is_empty() && input.query.is_empty()) => {
                    decode_fields(fields, input.params, input.query)
                }
                other => T::deserialize(other),
            };
            return result.map_err(|err| DecodeError::InvalidBody(err.to_string()));
        }

        if input.params.is_empty() && input.query.is_empty() {
            return Ok(T::default());
        }

        decode_fields(Map::new(), input.params, input.query)
            .map_err(|err| DecodeError::InvalidParams(err.to_string()))
    }

    fn encode<T>(&self, value: &T) -> Result<Bytes, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|err| EncodeError(err.to_string()))
    }
}

/// Returns `true` for `application/json` and `application/*+json`.
fn is_json(content_type: &str) -> bool {
    content_type.parse::<mime::Mime>().is_ok_and(|mime| {
        mime.type_() == mime::APPLICATION
            && (mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON))
    })
}
