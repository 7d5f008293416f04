//! Response sink.
//!
//! A [`ResponseWriter`] either buffers the whole response in memory
//! ([`ResponseWriter::new`], used by fixtures and tests) or streams it to a
//! binding through a [`ResponseReceiver`] ([`ResponseWriter::channel`]).
//!
//! In both modes the response head (status line plus headers) is committed
//! exactly once: by the first [`set_status`](ResponseWriter::set_status), by
//! the first body write (as `200 OK`), or by [`finish`](ResponseWriter::finish).
//! A streaming writer hands the head to the binding at that moment, so the
//! client sees the status line while the handler is still running.

use std::convert::Infallible;

use bytes::{Bytes, BytesMut};
use futures_util::Stream;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Response, StatusCode};
use tokio::sync::{mpsc, oneshot};

use crate::headers::{header_str, HeaderPairs};

/// The outbound response of one request.
///
/// [`status`](Self::status) reports the last status set. Only the first one
/// reaches the transport; later calls are recorded, logged and otherwise
/// ignored. Headers changed after the head is committed are kept for
/// [`header`](Self::header) reads but are not sent.
///
/// # Example
///
/// ```
/// use std::io::Write;
/// use http::StatusCode;
/// use trellis_core::ResponseWriter;
///
/// let mut response = ResponseWriter::new();
/// assert!(response.set_status(StatusCode::CREATED));
/// write!(response, "id={}", 7).unwrap();
///
/// assert!(!response.set_status(StatusCode::OK));
/// assert_eq!(response.status(), Some(StatusCode::OK));
///
/// let (status, _headers, body) = response.into_parts();
/// assert_eq!(status, StatusCode::CREATED);
/// assert_eq!(&body[..], b"id=7");
/// ```
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    committed: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
    stream: Option<StreamSink>,
}

#[derive(Debug)]
struct StreamSink {
    head: Option<oneshot::Sender<Response<()>>>,
    body: Option<mpsc::UnboundedSender<Bytes>>,
}

/// The binding's end of a streaming [`ResponseWriter`].
#[derive(Debug)]
pub struct ResponseReceiver {
    head: oneshot::Receiver<Response<()>>,
    body: mpsc::UnboundedReceiver<Bytes>,
}

impl ResponseReceiver {
    /// Waits for the response head.
    ///
    /// Returns `None` when the writer was dropped without committing, which
    /// only happens if the handler task died. Call it once.
    pub async fn head(&mut self) -> Option<Response<()>> {
        (&mut self.head).await.ok()
    }

    /// Turns the receiver into the body stream.
    ///
    /// The stream ends when the writer is finished or dropped.
    pub fn into_body_stream(self) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        futures_util::stream::unfold(self.body, |mut body| async move {
            body.recv().await.map(|chunk| (Ok(chunk), body))
        })
    }
}

impl ResponseWriter {
    /// Creates a writer that buffers the response in memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a streaming writer and the receiver a binding reads it from.
    ///
    /// # Example
    ///
    /// ```
    /// use http::StatusCode;
    /// use trellis_core::ResponseWriter;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let (mut writer, mut receiver) = ResponseWriter::channel();
    /// writer.set_status(StatusCode::ACCEPTED);
    ///
    /// let head = receiver.head().await.unwrap();
    /// assert_eq!(head.status(), StatusCode::ACCEPTED);
    /// # });
    /// ```
    #[must_use]
    pub fn channel() -> (Self, ResponseReceiver) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::unbounded_channel();
        let writer = Self {
            stream: Some(StreamSink {
                head: Some(head_tx),
                body: Some(body_tx),
            }),
            ..Self::default()
        };
        (
            writer,
            ResponseReceiver {
                head: head_rx,
                body: body_rx,
            },
        )
    }

    /// Sets the status.
    ///
    /// The first call commits the head and, for a streaming writer, sends it
    /// to the transport. Returns `false` when the head was already committed;
    /// the new value is still reported by [`status`](Self::status).
    pub fn set_status(&mut self, status: StatusCode) -> bool {
        self.status = Some(status);
        if let Some(committed) = self.committed {
            tracing::warn!(
                committed = committed.as_u16(),
                ignored = status.as_u16(),
                "response status already written"
            );
            return false;
        }
        self.commit(status);
        true
    }

    /// Returns the last status set, or `None` if none was set yet.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the status sent on the status line, once committed.
    #[must_use]
    pub const fn committed_status(&self) -> Option<StatusCode> {
        self.committed
    }

    /// Returns `true` once the head is committed.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    /// Returns `true` when a streaming writer's receiver has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.stream
            .as_ref()
            .is_some_and(|sink| sink.body.as_ref().map_or(true, mpsc::UnboundedSender::is_closed))
    }

    /// Replaces every value of `name` with `value`.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.warn_if_committed(&name);
        self.headers.insert(name, value);
    }

    /// Adds `value` to `name`, keeping existing values.
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.warn_if_committed(&name);
        self.headers.append(name, value);
    }

    /// Returns the first value of `name`, or `""` when absent.
    #[must_use]
    pub fn header(&self, name: &str) -> &str {
        header_str(&self.headers, name)
    }

    /// Iterates over the response headers, one pair per value.
    #[must_use]
    pub fn header_pairs(&self) -> HeaderPairs<'_> {
        HeaderPairs::new(&self.headers)
    }

    /// Returns the response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Writes bytes to the body, committing `200 OK` if nothing is committed.
    ///
    /// A streaming writer sends the bytes immediately; they are dropped if
    /// the client has gone away.
    pub fn write_bytes(&mut self, data: &[u8]) {
        if self.committed.is_none() {
            self.status.get_or_insert(StatusCode::OK);
            self.commit(StatusCode::OK);
        }
        if data.is_empty() {
            return;
        }
        match self.stream.as_mut() {
            Some(sink) => {
                if let Some(body) = &sink.body {
                    if body.send(Bytes::copy_from_slice(data)).is_err() {
                        tracing::debug!(bytes = data.len(), "response receiver closed, body dropped");
                    }
                }
            }
            None => self.body.extend_from_slice(data),
        }
    }

    /// Commits the head if needed and ends the body.
    ///
    /// A response that never set a status is `200 OK`. Returns the committed
    /// status. Writes after `finish` are discarded.
    pub fn finish(&mut self) -> StatusCode {
        if self.committed.is_none() {
            self.commit(StatusCode::OK);
        }
        if let Some(sink) = self.stream.as_mut() {
            sink.body = None;
        }
        self.committed.unwrap_or(StatusCode::OK)
    }

    /// Returns the body buffered so far. Streaming writers buffer nothing.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes a buffered writer, yielding the status, headers and body.
    ///
    /// A response that never committed a status is `200 OK`.
    #[must_use]
    pub fn into_parts(mut self) -> (StatusCode, HeaderMap, Bytes) {
        let status = self.finish();
        (status, self.headers, self.body.freeze())
    }

    fn commit(&mut self, status: StatusCode) {
        self.committed = Some(status);
        let Some(head_tx) = self.stream.as_mut().and_then(|sink| sink.head.take()) else {
            return;
        };
        let mut head = Response::new(());
        *head.status_mut() = status;
        *head.headers_mut() = self.headers.clone();
        if head_tx.send(head).is_err() {
            tracing::debug!(status = status.as_u16(), "response receiver closed before head");
        }
    }

    fn warn_if_committed(&self, name: &HeaderName) {
        if self.stream.is_some() && self.committed.is_some() {
            tracing::warn!(header = %name, "response head already sent, header not transmitted");
        }
    }
}

impl std::io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.is_closed() {
            return Err(std::io::ErrorKind::BrokenPipe.into());
        }
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
