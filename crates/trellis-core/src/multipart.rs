//! Multipart form parsing.
//!
//! Forms are parsed fully in memory with [`multer`]. There is no spill to
//! temporary files: a body larger than the caller's `max_memory` fails with
//! [`ParseError::TooLarge`] instead.

use bytes::Bytes;
use indexmap::IndexMap;

use crate::body::RequestBody;
use crate::error::ParseError;

/// Default memory threshold for multipart parsing (32 MiB).
pub const DEFAULT_MAX_MEMORY: u64 = 32 << 20;

/// An uploaded file from a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Form field name.
    pub field_name: String,
    /// Client-supplied file name.
    pub file_name: String,
    /// Content type of the part, when the client sent one.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl FileHeader {
    /// Returns the file size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A parsed `multipart/form-data` body.
///
/// Parts with a `filename` are files; every other part is a text value.
/// Both maps keep the order fields appeared in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    /// Text values by field name.
    pub values: IndexMap<String, Vec<String>>,
    /// Uploaded files by field name.
    pub files: IndexMap<String, Vec<FileHeader>>,
}

impl MultipartForm {
    /// Returns the first text value for `name`, or `""` when absent.
    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map_or("", String::as_str)
    }

    /// Returns the first file uploaded under `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&FileHeader> {
        self.files.get(name).and_then(|files| files.first())
    }

    /// Returns `true` when the form has no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.files.is_empty()
    }

    /// Parses `body` as `multipart/form-data`.
    ///
    /// `content_type` is the raw `Content-Type` header value. The body is
    /// consumed; it is left closed whether or not parsing succeeds.
    pub async fn parse(
        content_type: &str,
        body: &mut RequestBody,
        max_memory: u64,
    ) -> Result<Self, ParseError> {
        let boundary = multer::parse_boundary(content_type).map_err(|err| match err {
            multer::Error::NoBoundary => ParseError::MissingBoundary,
            _ => ParseError::NotMultipart {
                content_type: content_type.to_string(),
            },
        })?;

        let max_memory = body.limit().map_or(max_memory, |limit| limit.min(max_memory));
        let stream = body.take_data_stream()?;
        let constraints = multer::Constraints::new()
            .size_limit(multer::SizeLimit::new().whole_stream(max_memory));
        let mut multipart = multer::Multipart::with_constraints(stream, boundary, constraints);

        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| map_multer_error(err, max_memory))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(ToString::to_string);
            let part_type = field.content_type().map(ToString::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|err| map_multer_error(err, max_memory))?;

            match file_name {
                Some(file_name) => form.files.entry(name.clone()).or_default().push(FileHeader {
                    field_name: name,
                    file_name,
                    content_type: part_type,
                    data,
                }),
                None => form
                    .values
                    .entry(name)
                    .or_default()
                    .push(String::from_utf8_lossy(&data).into_owned()),
            }
        }

        Ok(form)
    }
}

fn map_multer_error(err: multer::Error, limit: u64) -> ParseError {
    match err {
        multer::Error::StreamSizeExceeded { .. } | multer::Error::FieldSizeExceeded { .. } => {
            ParseError::TooLarge { limit }
        }
        multer::Error::StreamReadFailed(source) => ParseError::Read(source.to_string()),
        other => ParseError::Malformed(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const BOUNDARY: &str = "X-TRELLIS-BOUNDARY";

    /// Builds a multipart body: `(name, filename, content type, data)` per part.
    pub(crate) fn create_multipart_body(parts: &[(&str, Option<&str>, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, content_type, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    pub(crate) fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    #[tokio::test]
    async fn test_parse_values_and_files() {
        let raw = create_multipart_body(&[
            ("title", None, "text/plain", b"report"),
            ("tag", None, "text/plain", b"q3"),
            ("tag", None, "text/plain", b"final"),
            ("upload", Some("report.csv"), "text/csv", b"a,b\n1,2\n"),
        ]);
        let mut body = RequestBody::from_bytes(raw);

        let form = MultipartForm::parse(&content_type(), &mut body, DEFAULT_MAX_MEMORY)
            .await
            .unwrap();

        assert_eq!(form.value("title"), "report");
        assert_eq!(form.values["tag"], vec!["q3", "final"]);
        assert_eq!(form.value("missing"), "");

        let file = form.file("upload").unwrap();
        assert_eq!(file.file_name, "report.csv");
        assert_eq!(file.content_type.as_deref(), Some("text/csv"));
        assert_eq!(file.size(), 8);
        assert!(body.is_closed());
    }

    #[tokio::test]
    async fn test_exceeding_max_memory_fails() {
        let big = vec![b'x'; 4096];
        let raw = create_multipart_body(&[("blob", Some("blob.bin"), "application/octet-stream", &big)]);
        let mut body = RequestBody::from_bytes(raw);

        let err = MultipartForm::parse(&content_type(), &mut body, 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, ParseError::TooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn test_body_cap_tightens_max_memory() {
        let big = vec![b'x'; 4096];
        let raw = create_multipart_body(&[("blob", Some("blob.bin"), "application/octet-stream", &big)]);
        let mut body = RequestBody::from_bytes(raw).with_limit(2048);

        let err = MultipartForm::parse(&content_type(), &mut body, DEFAULT_MAX_MEMORY)
            .await
            .unwrap_err();

        assert!(matches!(err, ParseError::TooLarge { limit: 2048 }));
    }

    #[tokio::test]
    async fn test_not_multipart() {
        let mut body = RequestBody::from_bytes("{}");
        let err = MultipartForm::parse("application/json", &mut body, DEFAULT_MAX_MEMORY)
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::NotMultipart { .. }));
        assert!(!body.is_closed(), "body is untouched when the type is wrong");
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let mut body = RequestBody::from_bytes("");
        let err = MultipartForm::parse("multipart/form-data", &mut body, DEFAULT_MAX_MEMORY)
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingBoundary));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut body = RequestBody::from_bytes("this is not multipart at all");
        let err = MultipartForm::parse(&content_type(), &mut body, DEFAULT_MAX_MEMORY)
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_closed_body() {
        let mut body = RequestBody::from_bytes(create_multipart_body(&[]));
        body.close();
        let err = MultipartForm::parse(&content_type(), &mut body, DEFAULT_MAX_MEMORY)
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::BodyClosed));
    }
}
