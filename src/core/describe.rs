//! Declarative type shapes
//!
//! Types exposed as resources (and every type reachable from their fields)
//! implement [`Describe`], which returns a [`TypeShape`]: a static table of
//! what the type looks like on the wire and which fields each HTTP method may
//! see. Descriptors, schemas, request filtering and client code are all
//! derived from this one table.
//!
//! Structs are normally described with [`impl_describe!`](crate::impl_describe):
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize, Default)]
//! #[serde(default)]
//! struct User {
//!     #[serde(rename = "Name")]
//!     name: String,
//!     #[serde(rename = "Phone")]
//!     phone: String,
//!     #[serde(rename = "IsAdmin")]
//!     is_admin: bool,
//! }
//!
//! impl_describe!(User {
//!     "Name": String [POST],
//!     "Phone": String [POST, PUT],
//!     "IsAdmin": bool,
//! });
//! ```
//!
//! Fields without a method list are read-only: visible when reading, never
//! accepted in a body. The `| hidden` flag removes a field from reads,
//! `| embedded` hoists a struct's fields into its parent (pair it with
//! `#[serde(flatten)]`), and `| countdown` presents a duration as a countdown.

use crate::core::error::SchemaError;
use crate::core::key::Key;
use crate::core::method::is_read;
use axum::http::Method as HttpMethod;
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Lazily evaluated shape, so self-referencing types can be declared
pub type ShapeFn = fn() -> TypeShape;

/// A type with a declared wire shape
pub trait Describe {
    fn shape() -> TypeShape;
}

/// Wire shape of a type
#[derive(Debug, Clone)]
pub enum TypeShape {
    String,
    Bool,
    Integer,
    Number,
    /// Opaque entity identifier, a string on the wire
    Key,
    /// An instant, never expanded into fields
    Time,
    /// Nanosecond count
    Duration,
    /// Any other indirection, which cannot be described
    Pointer(&'static str),
    Slice(ShapeFn),
    Map { key: ShapeFn, value: ShapeFn },
    Struct(StructShape),
}

impl TypeShape {
    /// Human readable name, used in descriptors and error messages
    pub fn name(&self) -> String {
        match self {
            TypeShape::String => "string".to_string(),
            TypeShape::Bool => "bool".to_string(),
            TypeShape::Integer => "integer".to_string(),
            TypeShape::Number => "number".to_string(),
            TypeShape::Key => "Key".to_string(),
            TypeShape::Time => "Time".to_string(),
            TypeShape::Duration => "Duration".to_string(),
            TypeShape::Pointer(name) => name.to_string(),
            TypeShape::Slice(elem) => format!("[]{}", elem().name()),
            TypeShape::Map { key, value } => format!("map[{}]{}", key().name(), value().name()),
            TypeShape::Struct(shape) => shape.name.to_string(),
        }
    }
}

/// Ordered field table of a struct
#[derive(Debug, Clone)]
pub struct StructShape {
    name: &'static str,
    fields: Vec<FieldShape>,
}

impl StructShape {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Append a field of type `T`
    pub fn field<T: Describe + ?Sized>(mut self, name: &'static str, rules: FieldRules) -> Self {
        self.fields.push(FieldShape {
            name,
            shape: T::shape,
            rules,
        });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }
}

impl From<StructShape> for TypeShape {
    fn from(shape: StructShape) -> Self {
        TypeShape::Struct(shape)
    }
}

/// One declared field
#[derive(Debug, Clone)]
pub struct FieldShape {
    pub name: &'static str,
    pub shape: ShapeFn,
    pub rules: FieldRules,
}

/// Visibility and presentation rules of a field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRules {
    methods: Vec<HttpMethod>,
    hidden: bool,
    embedded: bool,
    countdown: bool,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept this field in bodies of `method`
    pub fn allow(mut self, method: HttpMethod) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    /// Exclude this field from reads
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Hoist the fields of this struct-typed field into the parent
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    /// Present this duration field as a countdown
    pub fn countdown(mut self) -> Self {
        self.countdown = true;
        self
    }

    /// Parse a comma separated method list such as `"POST,PUT"`
    pub fn from_tag(tag: &str) -> Result<Self, SchemaError> {
        let mut rules = Self::new();
        for part in tag.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let method = HttpMethod::from_bytes(part.as_bytes()).map_err(|_| {
                SchemaError::InvalidMethodTag {
                    tag: tag.to_string(),
                }
            })?;
            rules = rules.allow(method);
        }
        Ok(rules)
    }

    /// Whether the field is visible in the context of `method`
    ///
    /// Reads are opt-out (visible unless hidden), every other method is
    /// opt-in through the method list.
    pub fn visible_for(&self, method: &HttpMethod) -> bool {
        if is_read(method) {
            !self.hidden
        } else {
            self.methods.contains(method)
        }
    }

    pub fn methods(&self) -> &[HttpMethod] {
        &self.methods
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn is_countdown(&self) -> bool {
        self.countdown
    }
}

/// Implement [`Describe`](crate::core::describe::Describe) for a struct from
/// a field table
///
/// Each entry is `"WireName": Type`, optionally followed by the methods that
/// accept the field in a body (`[POST, PUT]`) and flags (`| hidden`,
/// `| embedded`, `| countdown`). Field order is declaration order.
#[macro_export]
macro_rules! impl_describe {
    ($ty:ident { $( $field:literal : $fty:ty $( [ $( $meth:ident ),* $(,)? ] )? $( | $flag:ident )* ),* $(,)? }) => {
        impl $crate::core::describe::Describe for $ty {
            fn shape() -> $crate::core::describe::TypeShape {
                $crate::core::describe::StructShape::new(stringify!($ty))
                    $(
                        .field::<$fty>(
                            $field,
                            $crate::core::describe::FieldRules::new()
                                $( $( .allow($crate::HttpMethod::$meth) )* )?
                                $( .$flag() )*
                        )
                    )*
                    .into()
            }
        }
    };
}

macro_rules! describe_as {
    ($shape:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn shape() -> TypeShape {
                    $shape
                }
            }
        )+
    };
}

describe_as!(TypeShape::String => String, str, char, Uuid);
describe_as!(TypeShape::Bool => bool);
describe_as!(TypeShape::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
describe_as!(TypeShape::Number => f32, f64);
describe_as!(TypeShape::Key => Key);
describe_as!(TypeShape::Time => DateTime<Utc>);
describe_as!(TypeShape::Duration => std::time::Duration, TimeDelta);

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::Slice(T::shape)
    }
}

impl<T: Describe> Describe for VecDeque<T> {
    fn shape() -> TypeShape {
        TypeShape::Slice(T::shape)
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn shape() -> TypeShape {
        TypeShape::Slice(T::shape)
    }
}

impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn shape() -> TypeShape {
        TypeShape::Map {
            key: K::shape,
            value: V::shape,
        }
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn shape() -> TypeShape {
        TypeShape::Map {
            key: K::shape,
            value: V::shape,
        }
    }
}

impl<K: Describe, V: Describe, S> Describe for IndexMap<K, V, S> {
    fn shape() -> TypeShape {
        TypeShape::Map {
            key: K::shape,
            value: V::shape,
        }
    }
}

impl<T: Describe> Describe for Option<T> {
    fn shape() -> TypeShape {
        T::shape()
    }
}

macro_rules! describe_pointer {
    ($($ptr:ident),+) => {
        $(
            impl<T: ?Sized> Describe for $ptr<T> {
                fn shape() -> TypeShape {
                    TypeShape::Pointer(std::any::type_name::<Self>())
                }
            }
        )+
    };
}

describe_pointer!(Box, Arc, Rc);

/// Serde helper writing a [`std::time::Duration`] as a nanosecond count
///
/// ```rust,ignore
/// #[serde(with = "restbind::core::describe::duration_nanos")]
/// ttl: Duration,
/// ```
pub mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_describe;

    #[allow(dead_code)]
    struct Profile {
        name: String,
        secret: String,
        tags: Vec<String>,
    }

    impl_describe!(Profile {
        "Name": String [POST, PUT],
        "Secret": String [POST] | hidden,
        "Tags": Vec<String>,
    });

    fn struct_shape<T: Describe>() -> StructShape {
        match T::shape() {
            TypeShape::Struct(shape) => shape,
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_macro_declares_fields_in_order() {
        let shape = struct_shape::<Profile>();
        assert_eq!(shape.name(), "Profile");
        let names: Vec<_> = shape.fields().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Name", "Secret", "Tags"]);
    }

    #[test]
    fn test_macro_rules() {
        let shape = struct_shape::<Profile>();
        let name = &shape.fields()[0].rules;
        assert!(name.visible_for(&HttpMethod::POST));
        assert!(name.visible_for(&HttpMethod::PUT));
        assert!(name.visible_for(&HttpMethod::GET));

        let secret = &shape.fields()[1].rules;
        assert!(secret.visible_for(&HttpMethod::POST));
        assert!(!secret.visible_for(&HttpMethod::PUT));
        assert!(!secret.visible_for(&HttpMethod::GET));

        let tags = &shape.fields()[2].rules;
        assert!(tags.visible_for(&HttpMethod::GET));
        assert!(!tags.visible_for(&HttpMethod::POST));
    }

    #[test]
    fn test_from_tag() {
        let rules = FieldRules::from_tag("POST,PUT").unwrap();
        assert_eq!(rules.methods(), &[HttpMethod::POST, HttpMethod::PUT]);

        let rules = FieldRules::from_tag("").unwrap();
        assert!(rules.methods().is_empty());

        assert!(matches!(
            FieldRules::from_tag("POST,P UT"),
            Err(SchemaError::InvalidMethodTag { .. })
        ));
    }

    #[test]
    fn test_option_is_transparent() {
        assert!(matches!(<Option<i32>>::shape(), TypeShape::Integer));
        assert!(matches!(<Option<Key>>::shape(), TypeShape::Key));
    }

    #[test]
    fn test_pointers_and_names() {
        assert!(matches!(<Box<String>>::shape(), TypeShape::Pointer(_)));
        assert_eq!(<Vec<u8>>::shape().name(), "[]integer");
        assert_eq!(<HashMap<String, f64>>::shape().name(), "map[string]number");
    }

    #[test]
    fn test_duration_nanos() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Timer {
            #[serde(with = "duration_nanos")]
            left: std::time::Duration,
        }

        let timer = Timer {
            left: std::time::Duration::from_millis(3),
        };
        let json = serde_json::to_value(&timer).unwrap();
        assert_eq!(json, serde_json::json!({"left": 3_000_000}));
        let back: Timer = serde_json::from_value(json).unwrap();
        assert_eq!(back, timer);
    }
}
