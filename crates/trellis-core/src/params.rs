//! Path and query parameter storage.
//!
//! Path parameters arrive from the engine already matched and decoded; query
//! parameters are parsed from the raw query string the first time one is
//! asked for. Both return `""` for names that were never supplied.

use smallvec::SmallVec;
use std::sync::OnceLock;

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Ordered name/value pairs for path or query parameters.
///
/// Uses small-vector optimization to avoid heap allocation for routes with
/// a handful of parameters. Lookups return the first pair with a matching
/// name.
///
/// # Example
///
/// ```rust
/// use trellis_core::Params;
///
/// let mut params = Params::new();
/// params.push("id", "42");
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.value("missing"), "");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates a new empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter to the set.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value for a parameter, or `""` when it is absent.
    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Returns every value supplied for `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parses an `application/x-www-form-urlencoded` string.
    ///
    /// Malformed input yields an empty set: a bad query string is treated the
    /// same as no query string.
    #[must_use]
    pub fn parse_urlencoded(input: &str) -> Self {
        serde_urlencoded::from_str::<Vec<(String, String)>>(input)
            .map(|pairs| pairs.into_iter().collect())
            .unwrap_or_default()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Query parameters parsed on first access.
///
/// Holds the raw query string and parses it at most once.
#[derive(Debug, Default)]
pub struct LazyQuery {
    raw: Option<String>,
    parsed: OnceLock<Params>,
}

impl LazyQuery {
    /// Wraps a raw query string (without the leading `?`).
    #[must_use]
    pub fn new(raw: Option<&str>) -> Self {
        Self {
            raw: raw.map(ToString::to_string),
            parsed: OnceLock::new(),
        }
    }

    /// Returns the raw query string, if the URL had one.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Returns the parsed parameters.
    pub fn params(&self) -> &Params {
        self.parsed
            .get_or_init(|| self.raw.as_deref().map(Params::parse_urlencoded).unwrap_or_default())
    }

    /// Returns the first value for `name`, or `""` when it is absent.
    pub fn value(&self, name: &str) -> &str {
        self.params().value(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_push_and_get() {
        let mut params = Params::new();
        params.push("id", "123");
        params.push("name", "alice");

        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.value("name"), "alice");
        assert_eq!(params.get("unknown"), None);
        assert_eq!(params.value("unknown"), "");
    }

    #[test]
    fn test_params_first_value_wins() {
        let params = Params::parse_urlencoded("tag=a&tag=b&x=1");
        assert_eq!(params.value("tag"), "a");
        assert_eq!(params.get_all("tag").collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_params_iter_preserves_order() {
        let params: Params = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]
        .into_iter()
        .collect();

        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("a", "1")]);
    }

    #[test]
    fn test_params_many_params() {
        let mut params = Params::new();
        for i in 0..10 {
            params.push(format!("key{i}"), format!("value{i}"));
        }

        assert_eq!(params.len(), 10);
        assert_eq!(params.get("key5"), Some("value5"));
    }

    #[test]
    fn test_parse_urlencoded_decodes() {
        let params = Params::parse_urlencoded("q=hello%20world&plus=a+b");
        assert_eq!(params.value("q"), "hello world");
        assert_eq!(params.value("plus"), "a b");
    }

    #[test]
    fn test_lazy_query() {
        let query = LazyQuery::new(Some("page=2&sort=asc"));
        assert_eq!(query.raw(), Some("page=2&sort=asc"));
        assert_eq!(query.value("page"), "2");
        assert_eq!(query.value("limit"), "");
    }

    #[test]
    fn test_lazy_query_absent() {
        let query = LazyQuery::new(None);
        assert!(query.params().is_empty());
        assert_eq!(query.value("anything"), "");
    }
}
