//! TLS connection state.

use bytes::Bytes;

/// Negotiated state of a TLS connection.
///
/// Trellis does not terminate TLS. An embedder that does inserts a `TlsInfo`
/// into the request extensions, and the binding surfaces it through
/// [`Context::request_tls`](crate::Context::request_tls). Plaintext requests
/// carry none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsInfo {
    /// Protocol version, e.g. `"TLSv1.3"`.
    pub protocol_version: Option<String>,
    /// Negotiated cipher suite name.
    pub cipher_suite: Option<String>,
    /// ALPN protocol agreed with the client, e.g. `b"h2"`.
    pub alpn_protocol: Option<Bytes>,
    /// SNI server name requested by the client.
    pub server_name: Option<String>,
    /// Peer certificate chain in DER, leaf first. Empty without client auth.
    pub peer_certificates: Vec<Bytes>,
}

impl TlsInfo {
    /// Creates an empty TLS state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the protocol version.
    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = Some(version.into());
        self
    }

    /// Sets the cipher suite.
    #[must_use]
    pub fn with_cipher_suite(mut self, suite: impl Into<String>) -> Self {
        self.cipher_suite = Some(suite.into());
        self
    }

    /// Sets the ALPN protocol.
    #[must_use]
    pub fn with_alpn_protocol(mut self, protocol: impl Into<Bytes>) -> Self {
        self.alpn_protocol = Some(protocol.into());
        self
    }

    /// Sets the SNI server name.
    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Appends a DER-encoded peer certificate.
    #[must_use]
    pub fn with_peer_certificate(mut self, der: impl Into<Bytes>) -> Self {
        self.peer_certificates.push(der.into());
        self
    }

    /// Returns `true` when the client presented a certificate.
    #[must_use]
    pub fn has_peer_certificate(&self) -> bool {
        !self.peer_certificates.is_empty()
    }
}
