//! Header access helpers.

use http::header::{self, HeaderMap, HeaderValue};
use http::Uri;

/// Lazy iterator over header name/value pairs.
///
/// Yields one pair per value, so a header sent twice appears twice. Values
/// that are not visible ASCII are reported as `""`. Nothing is copied; the
/// iterator borrows the underlying map and may be dropped at any point.
///
/// # Example
///
/// ```
/// use http::{HeaderMap, HeaderValue};
/// use trellis_core::HeaderPairs;
///
/// let mut headers = HeaderMap::new();
/// headers.append("accept", HeaderValue::from_static("text/html"));
/// headers.append("accept", HeaderValue::from_static("application/json"));
///
/// let pairs: Vec<_> = HeaderPairs::new(&headers).collect();
/// assert_eq!(pairs, vec![("accept", "text/html"), ("accept", "application/json")]);
/// ```
#[derive(Debug)]
pub struct HeaderPairs<'a> {
    inner: header::Iter<'a, HeaderValue>,
}

impl<'a> HeaderPairs<'a> {
    /// Creates an iterator over `headers`.
    #[must_use]
    pub fn new(headers: &'a HeaderMap) -> Self {
        Self {
            inner: headers.iter(),
        }
    }
}

impl<'a> Iterator for HeaderPairs<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or("")))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Returns the first value of `name`, or `""` when absent or not visible ASCII.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Returns the requested host.
///
/// Prefers the `Host` header and falls back to the authority of an
/// absolute-form target; `""` when neither is present.
pub fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> &'a str {
    match header_str(headers, header::HOST.as_str()) {
        "" => uri.authority().map_or("", http::uri::Authority::as_str),
        host => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));
        headers
    }

    #[test]
    fn test_one_pair_per_value() {
        let headers = sample();
        let pairs: Vec<_> = HeaderPairs::new(&headers).collect();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&("x-tag", "a")));
        assert!(pairs.contains(&("x-tag", "b")));
    }

    #[test]
    fn test_iteration_is_repeatable() {
        let headers = sample();
        let first: Vec<_> = HeaderPairs::new(&headers).collect();
        let second: Vec<_> = HeaderPairs::new(&headers).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_early_stop() {
        let headers = sample();
        let found = HeaderPairs::new(&headers).find(|(name, _)| *name == "content-type");
        assert_eq!(found, Some(("content-type", "text/plain")));
    }

    #[test]
    fn test_opaque_values_read_as_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("x-bin", HeaderValue::from_bytes(&[0xfa, 0xfb]).unwrap());

        assert_eq!(header_str(&headers, "x-bin"), "");
        assert_eq!(HeaderPairs::new(&headers).next(), Some(("x-bin", "")));
    }

    #[test]
    fn test_header_str_absent_and_invalid_name() {
        let headers = sample();
        assert_eq!(header_str(&headers, "x-missing"), "");
        assert_eq!(header_str(&headers, "not a header name"), "");
        assert_eq!(header_str(&headers, "Content-Type"), "text/plain");
    }

    #[test]
    fn test_request_host() {
        let mut headers = HeaderMap::new();
        let origin_form = Uri::from_static("/items");
        let absolute = Uri::from_static("http://api.example.com:8080/items");

        assert_eq!(request_host(&headers, &origin_form), "");
        assert_eq!(request_host(&headers, &absolute), "api.example.com:8080");

        headers.insert(header::HOST, HeaderValue::from_static("example.org"));
        assert_eq!(request_host(&headers, &absolute), "example.org");
    }

    proptest! {
        #[test]
        fn prop_appended_values_all_iterated(values in proptest::collection::vec("[a-z0-9]{1,12}", 1..8)) {
            let mut headers = HeaderMap::new();
            for value in &values {
                headers.append("x-multi", HeaderValue::from_str(value).unwrap());
            }

            let seen: Vec<&str> = HeaderPairs::new(&headers).map(|(_, v)| v).collect();
            prop_assert_eq!(seen, values.iter().map(String::as_str).collect::<Vec<_>>());
            prop_assert_eq!(header_str(&headers, "x-multi"), values[0].as_str());
        }
    }
}
