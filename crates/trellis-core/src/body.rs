//! Request body stream.

use bytes::{Bytes, BytesMut};
use http_body::Body;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyDataStream, BodyExt, Empty, Full};

use crate::error::ParseError;

/// Boxed error type carried by body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The inbound request body as a readable, closable byte stream.
///
/// Any [`http_body::Body`] with `Bytes` data can back a `RequestBody`, so the
/// same type serves every engine binding. Once closed, every read fails with
/// [`ParseError::BodyClosed`].
///
/// # Example
///
/// ```
/// use trellis_core::RequestBody;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut body = RequestBody::from_bytes("hello");
/// let bytes = body.bytes(1024).await.unwrap();
/// assert_eq!(&bytes[..], b"hello");
/// assert!(body.is_closed());
/// # });
/// ```
pub struct RequestBody {
    inner: Option<UnsyncBoxBody<Bytes, BoxError>>,
    bytes_read: u64,
    limit: Option<u64>,
}

impl RequestBody {
    /// Wraps any HTTP body.
    pub fn new<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self {
            inner: Some(body.map_err(Into::into).boxed_unsync()),
            bytes_read: 0,
            limit: None,
        }
    }

    /// Caps the total number of bytes the body may deliver.
    ///
    /// Once more than `limit` bytes have arrived every read path fails with
    /// [`ParseError::TooLarge`] and the body is closed.
    ///
    /// ```
    /// use trellis_core::{ParseError, RequestBody};
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let mut body = RequestBody::from_bytes("0123456789").with_limit(4);
    /// let err = body.bytes(1024).await.unwrap_err();
    /// assert!(matches!(err, ParseError::TooLarge { limit: 4 }));
    /// # });
    /// ```
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the cap set by [`with_limit`](Self::with_limit).
    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Creates an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Empty::<Bytes>::new())
    }

    /// Creates a body from an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(Full::new(bytes.into()))
    }

    /// Reads the next chunk of data.
    ///
    /// Returns `Ok(None)` at end of stream. Trailers are skipped.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, ParseError> {
        let body = self.inner.as_mut().ok_or(ParseError::BodyClosed)?;
        loop {
            match body.frame().await {
                None => return Ok(None),
                Some(Err(err)) => return Err(ParseError::Read(err.to_string())),
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        if data.is_empty() {
                            continue;
                        }
                        self.bytes_read += data.len() as u64;
                        if let Some(limit) = self.limit.filter(|limit| self.bytes_read > *limit) {
                            self.close();
                            return Err(ParseError::TooLarge { limit });
                        }
                        return Ok(Some(data));
                    }
                }
            }
        }
    }

    /// Reads the remaining body into memory and closes the stream.
    ///
    /// Fails with [`ParseError::TooLarge`] as soon as more than `limit` bytes
    /// have been received; the stream is closed either way.
    pub async fn bytes(&mut self, limit: u64) -> Result<Bytes, ParseError> {
        let mut buf = BytesMut::new();
        let result = loop {
            match self.chunk().await {
                Ok(Some(chunk)) => {
                    if (buf.len() + chunk.len()) as u64 > limit {
                        break Err(ParseError::TooLarge { limit });
                    }
                    buf.extend_from_slice(&chunk);
                }
                Ok(None) => break Ok(buf.freeze()),
                Err(err) => break Err(err),
            }
        };
        self.close();
        result
    }

    /// Closes the body, discarding anything not yet read.
    pub fn close(&mut self) {
        self.inner = None;
    }

    /// Returns `true` once the body has been closed or handed off.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Returns the number of data bytes read so far through [`chunk`](Self::chunk).
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns `true` when the stream reports no data left to read.
    #[must_use]
    pub fn is_end_stream(&self) -> bool {
        self.inner.as_ref().map_or(true, Body::is_end_stream)
    }

    /// Hands the unread stream to a streaming parser, closing this body.
    ///
    /// Fails when the body is closed or partially read.
    pub(crate) fn take_data_stream(
        &mut self,
    ) -> Result<BodyDataStream<UnsyncBoxBody<Bytes, BoxError>>, ParseError> {
        if self.bytes_read > 0 {
            return Err(ParseError::BodyClosed);
        }
        self.inner
            .take()
            .map(BodyExt::into_data_stream)
            .ok_or(ParseError::BodyClosed)
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBody")
            .field("closed", &self.is_closed())
            .field("bytes_read", &self.bytes_read)
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use http_body_util::StreamBody;

    fn chunked(parts: &[&'static str]) -> RequestBody {
        let frames = parts
            .iter()
            .copied()
            .map(|part| {
                Ok::<_, std::io::Error>(http_body::Frame::data(Bytes::from_static(
                    part.as_bytes(),
                )))
            })
            .collect::<Vec<_>>();
        RequestBody::new(StreamBody::new(stream::iter(frames)))
    }

    #[tokio::test]
    async fn test_chunk_reads_in_order() {
        let mut body = chunked(&["ab", "", "cd"]);
        assert_eq!(body.chunk().await.unwrap(), Some(Bytes::from_static(b"ab")));
        assert_eq!(body.chunk().await.unwrap(), Some(Bytes::from_static(b"cd")));
        assert_eq!(body.chunk().await.unwrap(), None);
        assert_eq!(body.bytes_read(), 4);
    }

    #[tokio::test]
    async fn test_bytes_collects_and_closes() {
        let mut body = chunked(&["hello ", "world"]);
        let bytes = body.bytes(64).await.unwrap();
        assert_eq!(&bytes[..], b"hello world");
        assert!(body.is_closed());
    }

    #[tokio::test]
    async fn test_bytes_respects_limit() {
        let mut body = chunked(&["0123456789", "0123456789"]);
        let err = body.bytes(15).await.unwrap_err();
        assert!(matches!(err, ParseError::TooLarge { limit: 15 }));
        assert!(body.is_closed());
    }

    #[tokio::test]
    async fn test_closed_body_rejects_reads() {
        let mut body = RequestBody::from_bytes("data");
        body.close();
        assert!(matches!(body.chunk().await, Err(ParseError::BodyClosed)));
        assert!(matches!(body.bytes(10).await, Err(ParseError::BodyClosed)));
    }

    #[tokio::test]
    async fn test_read_error_surfaces() {
        let frames: Vec<Result<http_body::Frame<Bytes>, std::io::Error>> = vec![Err(
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
        )];
        let mut body = RequestBody::new(StreamBody::new(stream::iter(frames)));
        assert!(matches!(body.chunk().await, Err(ParseError::Read(_))));
    }

    #[test]
    fn test_empty_body_is_end_stream() {
        assert!(RequestBody::empty().is_end_stream());
        assert!(!RequestBody::from_bytes("x").is_end_stream());
    }

    #[tokio::test]
    async fn test_take_stream_after_partial_read_fails() {
        let mut body = chunked(&["a", "b"]);
        body.chunk().await.unwrap();
        assert!(matches!(body.take_data_stream(), Err(ParseError::BodyClosed)));
    }

    #[tokio::test]
    async fn test_cap_applies_to_chunk_reads() {
        let mut body = chunked(&["0123", "4567", "89"]).with_limit(8);
        assert_eq!(body.limit(), Some(8));
        assert!(body.chunk().await.unwrap().is_some());
        assert!(body.chunk().await.unwrap().is_some());
        let err = body.chunk().await.unwrap_err();
        assert!(matches!(err, ParseError::TooLarge { limit: 8 }));
        assert!(body.is_closed());
    }

    #[tokio::test]
    async fn test_smaller_of_cap_and_read_limit_wins() {
        let mut body = chunked(&["0123456789"]).with_limit(100);
        let err = body.bytes(5).await.unwrap_err();
        assert!(matches!(err, ParseError::TooLarge { limit: 5 }));

        let mut body = chunked(&["0123456789"]).with_limit(10);
        assert_eq!(body.bytes(64).await.unwrap().len(), 10);
    }
}
