//! Request fields gathered from the JSON body, path and query.
//!
//! Path and query values arrive as text, so they deserialize through
//! [`TextDeserializer`], which parses numbers and booleans on demand. Body
//! fields keep their JSON types.

use indexmap::IndexMap;
use serde::de::value::{MapDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, Deserializer as _, IntoDeserializer, Unexpected, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};

use crate::params::Params;

/// Deserializes `T` from the merged request fields.
///
/// A name is taken from the first source that has it: the body, then the
/// path parameters, then the query. Within the query the first occurrence of
/// a repeated name wins.
pub(crate) fn decode_fields<T: DeserializeOwned>(
    body: Map<String, Value>,
    params: &Params,
    query: &Params,
) -> Result<T, serde_json::Error> {
    let mut fields: IndexMap<String, FieldValue> = body
        .into_iter()
        .map(|(name, value)| (name, FieldValue::Json(value)))
        .collect();
    for (name, value) in params.iter().chain(query.iter()) {
        fields
            .entry(name.to_owned())
            .or_insert_with(|| FieldValue::Text(value.to_owned()));
    }

    T::deserialize(MapDeserializer::<_, serde_json::Error>::new(fields.into_iter()))
}

/// One field value, typed JSON or raw text.
#[derive(Debug)]
enum FieldValue {
    Json(Value),
    Text(String),
}

impl<'de> IntoDeserializer<'de, serde_json::Error> for FieldValue {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! forward_field {
    ($($method:ident),* $(,)?) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
            match self {
                Self::Json(value) => value.$method(visitor),
                Self::Text(text) => TextDeserializer(text).$method(visitor),
            }
        }
    )*};
}

impl<'de> de::Deserializer<'de> for FieldValue {
    type Error = serde_json::Error;

    forward_field! {
        deserialize_any, deserialize_bool,
        deserialize_i8, deserialize_i16, deserialize_i32, deserialize_i64, deserialize_i128,
        deserialize_u8, deserialize_u16, deserialize_u32, deserialize_u64, deserialize_u128,
        deserialize_f32, deserialize_f64, deserialize_char, deserialize_str, deserialize_string,
        deserialize_bytes, deserialize_byte_buf, deserialize_option, deserialize_unit,
        deserialize_seq, deserialize_map, deserialize_identifier, deserialize_ignored_any,
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Self::Json(value) => value.deserialize_unit_struct(name, visitor),
            Self::Text(text) => TextDeserializer(text).deserialize_unit_struct(name, visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Self::Json(value) => value.deserialize_newtype_struct(name, visitor),
            Self::Text(text) => TextDeserializer(text).deserialize_newtype_struct(name, visitor),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Self::Json(value) => value.deserialize_tuple(len, visitor),
            Self::Text(text) => TextDeserializer(text).deserialize_tuple(len, visitor),
        }
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Self::Json(value) => value.deserialize_tuple_struct(name, len, visitor),
            Self::Text(text) => TextDeserializer(text).deserialize_tuple_struct(name, len, visitor),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Self::Json(value) => value.deserialize_struct(name, fields, visitor),
            Self::Text(text) => TextDeserializer(text).deserialize_struct(name, fields, visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Self::Json(value) => value.deserialize_enum(name, variants, visitor),
            Self::Text(text) => TextDeserializer(text).deserialize_enum(name, variants, visitor),
        }
    }
}

/// Deserializes a path or query value, parsing scalars as the target asks.
struct TextDeserializer(String);

macro_rules! parse_text {
    ($($method:ident => $visit:ident),* $(,)?) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
            match self.0.parse() {
                Ok(value) => visitor.$visit(value),
                Err(_) => Err(de::Error::invalid_value(Unexpected::Str(&self.0), &visitor)),
            }
        }
    )*};
}

impl<'de> de::Deserializer<'de> for TextDeserializer {
    type Error = serde_json::Error;

    parse_text! {
        deserialize_bool => visit_bool,
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_i128 => visit_i128,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_u128 => visit_u128,
        deserialize_f32 => visit_f32,
        deserialize_f64 => visit_f64,
        deserialize_char => visit_char,
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_string(self.0)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_string(self.0)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_string(self.0)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_string(self.0)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_byte_buf(self.0.into_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_byte_buf(self.0.into_bytes())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_enum(StringDeserializer::<serde_json::Error>::new(self.0))
    }

    forward_to_deserialize_any! {
        seq tuple tuple_struct map struct unit_struct ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Order {
        Asc,
        Desc,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Search {
        id: u64,
        name: String,
        active: bool,
        ratio: f64,
        order: Order,
        cursor: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
    }

    fn path(pairs: &[(&str, &str)]) -> Params {
        let mut params = Params::new();
        for (name, value) in pairs {
            params.push(*name, *value);
        }
        params
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_text_values_take_the_target_type() {
        let params = path(&[("id", "7"), ("name", "007")]);
        let query = Params::parse_urlencoded("active=true&ratio=0.5&order=desc&cursor=abc");

        let search: Search = decode_fields(Map::new(), &params, &query).unwrap();
        assert_eq!(
            search,
            Search {
                id: 7,
                name: "007".into(),
                active: true,
                ratio: 0.5,
                order: Order::Desc,
                cursor: Some("abc".into()),
                tags: Vec::new(),
            }
        );
    }

    #[test]
    fn test_body_then_path_then_query() {
        let body = object(serde_json::json!({"name": "from-body", "tags": ["a"]}));
        let params = path(&[("id", "1"), ("name", "from-path")]);
        let query = Params::parse_urlencoded(
            "id=2&name=from-query&active=false&ratio=1&order=asc&order=desc",
        );

        let search: Search = decode_fields(body, &params, &query).unwrap();
        assert_eq!(search.id, 1);
        assert_eq!(search.name, "from-body");
        assert_eq!(search.tags, vec!["a".to_string()]);
        assert_eq!(search.order, Order::Asc);
        assert!(!search.active);
    }

    #[test]
    fn test_unparsable_text_names_the_value() {
        let params = path(&[("id", "seven")]);
        let err = decode_fields::<Search>(Map::new(), &params, &Params::new()).unwrap_err();
        assert!(err.to_string().contains("seven"), "{err}");
    }

    #[test]
    fn test_body_types_are_not_coerced() {
        let body = object(serde_json::json!({"id": "1"}));
        let result = decode_fields::<Search>(body, &Params::new(), &Params::new());
        assert!(result.is_err());
    }
}
