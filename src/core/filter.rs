//! Method-aware request body filtering
//!
//! Inbound bodies go through two stages: the payload is decoded into an
//! untyped JSON value and every key that is not a visible field for the
//! request method is pruned, then the pruned value is bound onto the typed
//! destination. A POST can therefore never set a PUT-only or read-only field,
//! whatever the destination's own deserializer would accept.
//!
//! Unknown keys are dropped silently.

use crate::core::describe::Describe;
use crate::core::doc_type::{DocKind, DocType};
use crate::core::error::DecodeError;
use axum::http::Method as HttpMethod;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Remove every key of `object` that `doc_type` does not list, recursively
pub fn filter_object(doc_type: &DocType, object: &mut Map<String, Value>) {
    object.retain(|key, _| doc_type.get_field(key).is_some());
    for (key, value) in object.iter_mut() {
        if let Some(field) = doc_type.get_field(key) {
            filter_value(&field.doc_type, value);
        }
    }
}

/// Filter the objects nested inside `value`
///
/// Scalars are left alone; the typed bind decides whether they fit.
pub fn filter_value(doc_type: &DocType, value: &mut Value) {
    match (doc_type.kind, value) {
        (DocKind::Struct, Value::Object(object)) => filter_object(doc_type, object),
        (DocKind::Slice, Value::Array(items)) => {
            if let Some(elem) = &doc_type.elem {
                for item in items {
                    filter_value(elem, item);
                }
            }
        }
        (DocKind::Map, Value::Object(entries)) => {
            if let Some(value_type) = &doc_type.value {
                for entry in entries.values_mut() {
                    filter_value(value_type, entry);
                }
            }
        }
        _ => {}
    }
}

/// Decode `payload`, keep only the fields `T` exposes for `method`, and bind
/// the result onto a `T`
pub fn bind_filtered<T>(payload: &[u8], method: &HttpMethod) -> Result<T, DecodeError>
where
    T: Describe + DeserializeOwned,
{
    let mut decoded: Value = serde_json::from_slice(payload).map_err(DecodeError::Malformed)?;
    let doc_type = DocType::of::<T>(method)?;
    if doc_type.kind != DocKind::Struct {
        return Err(DecodeError::NotAStruct {
            type_name: doc_type.name,
        });
    }
    let Value::Object(object) = &mut decoded else {
        return Err(DecodeError::NotAnObject);
    };
    filter_object(&doc_type, object);

    serde_json::from_value(decoded).map_err(DecodeError::Bind)
}
