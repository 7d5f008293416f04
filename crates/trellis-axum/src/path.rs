//! Path pattern translation.
//!
//! Routes are written with brace parameters (`/items/{id}`, `/files/{*rest}`).
//! axum 0.7 spells the same thing `/items/:id` and `/files/*rest`. The
//! translation is purely lexical, so it only accepts patterns where that is
//! unambiguous: every parameter spans a whole segment and static segments
//! contain none of axum's reserved characters.

use crate::error::AdapterError;

/// Translates a brace-syntax path pattern into axum syntax.
///
/// # Example
///
/// ```
/// use trellis_axum::translate_path;
///
/// assert_eq!(translate_path("/items/{id}").unwrap(), "/items/:id");
/// assert_eq!(translate_path("/static/{*path}").unwrap(), "/static/*path");
/// assert!(translate_path("/items/{id").is_err());
/// ```
pub fn translate_path(path: &str) -> Result<String, AdapterError> {
    if !path.starts_with('/') {
        return Err(AdapterError::invalid_path(path, "must start with '/'"));
    }

    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;
    let mut translated = Vec::with_capacity(segments.len());

    for (index, segment) in segments.iter().enumerate() {
        translated.push(translate_segment(path, segment, index == last)?);
    }

    Ok(translated.join("/"))
}

fn translate_segment(path: &str, segment: &str, is_last: bool) -> Result<String, AdapterError> {
    let Some(inner) = segment.strip_prefix('{') else {
        if segment.contains(['{', '}']) {
            return Err(AdapterError::invalid_path(
                path,
                format!("parameter in {segment:?} must span the whole segment"),
            ));
        }
        if segment.contains([':', '*']) {
            return Err(AdapterError::invalid_path(
                path,
                format!("segment {segment:?} contains a reserved character"),
            ));
        }
        return Ok(segment.to_string());
    };

    let name = inner.strip_suffix('}').ok_or_else(|| {
        AdapterError::invalid_path(path, format!("unclosed parameter in {segment:?}"))
    })?;

    let (prefix, name) = match name.strip_prefix('*') {
        Some(rest) if is_last => ('*', rest),
        Some(_) => {
            return Err(AdapterError::invalid_path(
                path,
                "catch-all parameter must be the last segment",
            ))
        }
        None => (':', name),
    };

    if name.is_empty() {
        return Err(AdapterError::invalid_path(path, "empty parameter name"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AdapterError::invalid_path(
            path,
            format!("invalid parameter name {name:?}"),
        ));
    }

    Ok(format!("{prefix}{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_static_paths_unchanged() {
        assert_eq!(translate_path("/").unwrap(), "/");
        assert_eq!(translate_path("/health").unwrap(), "/health");
        assert_eq!(translate_path("/api/v1/items/").unwrap(), "/api/v1/items/");
    }

    #[test]
    fn test_named_parameters() {
        assert_eq!(
            translate_path("/users/{user_id}/orders/{order-id}").unwrap(),
            "/users/:user_id/orders/:order-id"
        );
    }

    #[test]
    fn test_catch_all() {
        assert_eq!(translate_path("/assets/{*file}").unwrap(), "/assets/*file");
        assert!(translate_path("/assets/{*file}/meta").is_err());
    }

    #[test]
    fn test_rejects_malformed_patterns() {
        for bad in [
            "items",
            "",
            "/items/{id",
            "/items/id}",
            "/items/{}",
            "/items/{a{b}}",
            "/items/prefix-{id}",
            "/items/{id}.json",
            "/items/{i d}",
            "/items/:id",
            "/files/*",
        ] {
            assert!(translate_path(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    proptest! {
        #[test]
        fn prop_translation_is_lexical(
            statics in proptest::collection::vec("[a-z0-9_.-]{1,8}", 0..4),
            names in proptest::collection::vec("[a-zA-Z][a-zA-Z0-9_]{0,8}", 1..4),
        ) {
            let mut brace = String::new();
            let mut native = String::new();
            for (i, name) in names.iter().enumerate() {
                if let Some(segment) = statics.get(i) {
                    brace.push_str(&format!("/{segment}"));
                    native.push_str(&format!("/{segment}"));
                }
                brace.push_str(&format!("/{{{name}}}"));
                native.push_str(&format!("/:{name}"));
            }

            prop_assert_eq!(translate_path(&brace).unwrap(), native);
        }
    }
}
