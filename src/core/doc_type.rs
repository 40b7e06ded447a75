//! Type descriptors
//!
//! A [`DocType`] is the view of one type for one HTTP method: the fields a
//! body may carry for POST differ from the ones PUT accepts, and both differ
//! from what a GET shows. Descriptors for the same type but different methods
//! are independent values.

use crate::core::describe::{Describe, StructShape, TypeShape};
use crate::core::error::SchemaError;
use axum::http::Method as HttpMethod;

/// Kind of a described type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    String,
    Bool,
    Integer,
    Number,
    Key,
    Time,
    Duration,
    Countdown,
    Struct,
    Slice,
    Map,
}

impl DocKind {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, DocKind::Struct | DocKind::Slice | DocKind::Map)
    }
}

/// Description of a type in the context of one method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocType {
    pub kind: DocKind,
    pub name: String,
    /// Element of a slice
    pub elem: Option<Box<DocType>>,
    /// Value of a map
    pub value: Option<Box<DocType>>,
    /// Visible fields of a struct, in declaration order
    pub fields: Vec<DocField>,
    pub method: HttpMethod,
}

/// One visible field of a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocField {
    pub name: String,
    pub doc_type: DocType,
    /// Methods whose bodies may carry this field
    pub methods: Vec<HttpMethod>,
}

impl DocType {
    /// Describe `T` for `method`
    pub fn of<T: Describe + ?Sized>(method: &HttpMethod) -> Result<Self, SchemaError> {
        Self::new(&T::shape(), method)
    }

    /// Describe `shape` for `method`
    pub fn new(shape: &TypeShape, method: &HttpMethod) -> Result<Self, SchemaError> {
        Builder {
            method,
            stack: Vec::new(),
        }
        .build(shape)
    }

    pub fn get_field(&self, name: &str) -> Option<&DocField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether any field is visible for this descriptor's method
    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    fn bare(kind: DocKind, shape: &TypeShape, method: &HttpMethod) -> Self {
        Self {
            kind,
            name: shape.name(),
            elem: None,
            value: None,
            fields: Vec::new(),
            method: method.clone(),
        }
    }
}

struct Builder<'a> {
    method: &'a HttpMethod,
    // Structs currently being expanded
    stack: Vec<&'static str>,
}

impl Builder<'_> {
    fn build(&mut self, shape: &TypeShape) -> Result<DocType, SchemaError> {
        let kind = match shape {
            TypeShape::String => DocKind::String,
            TypeShape::Bool => DocKind::Bool,
            TypeShape::Integer => DocKind::Integer,
            TypeShape::Number => DocKind::Number,
            TypeShape::Key => DocKind::Key,
            TypeShape::Time => DocKind::Time,
            TypeShape::Duration => DocKind::Duration,
            TypeShape::Pointer(name) => {
                return Err(SchemaError::Untranslatable {
                    type_name: name.to_string(),
                });
            }
            TypeShape::Slice(elem) => {
                let mut doc_type = DocType::bare(DocKind::Slice, shape, self.method);
                doc_type.elem = Some(Box::new(self.build(&elem())?));
                return Ok(doc_type);
            }
            TypeShape::Map { key, value } => {
                let key = key();
                if !matches!(key, TypeShape::String | TypeShape::Key | TypeShape::Integer) {
                    return Err(SchemaError::MapKey {
                        type_name: key.name(),
                    });
                }
                let mut doc_type = DocType::bare(DocKind::Map, shape, self.method);
                doc_type.value = Some(Box::new(self.build(&value())?));
                return Ok(doc_type);
            }
            TypeShape::Struct(inner) => {
                let mut doc_type = DocType::bare(DocKind::Struct, shape, self.method);
                self.enter(inner)?;
                let mut fields = Vec::new();
                let result = self.collect_fields(inner, inner.name(), &mut fields);
                self.stack.pop();
                result?;
                doc_type.fields = fields;
                return Ok(doc_type);
            }
        };
        Ok(DocType::bare(kind, shape, self.method))
    }

    fn enter(&mut self, shape: &StructShape) -> Result<(), SchemaError> {
        if self.stack.contains(&shape.name()) {
            return Err(SchemaError::Recursive {
                type_name: shape.name().to_string(),
            });
        }
        self.stack.push(shape.name());
        Ok(())
    }

    /// Append the visible fields of `shape` to `out`, hoisting embedded structs
    fn collect_fields(
        &mut self,
        shape: &StructShape,
        owner: &'static str,
        out: &mut Vec<DocField>,
    ) -> Result<(), SchemaError> {
        for field in shape.fields() {
            if !field.rules.visible_for(self.method) {
                continue;
            }
            let field_shape = (field.shape)();

            if field.rules.is_embedded() {
                let TypeShape::Struct(inner) = &field_shape else {
                    return Err(SchemaError::EmbeddedNotStruct {
                        type_name: owner.to_string(),
                        field: field.name.to_string(),
                    });
                };
                self.enter(inner)?;
                let result = self.collect_fields(inner, owner, out);
                self.stack.pop();
                result?;
                continue;
            }

            let mut doc_type = self.build(&field_shape)?;
            if field.rules.is_countdown() {
                if doc_type.kind != DocKind::Duration {
                    return Err(SchemaError::CountdownNotDuration {
                        type_name: owner.to_string(),
                        field: field.name.to_string(),
                    });
                }
                doc_type.kind = DocKind::Countdown;
            }

            if out.iter().any(|f| f.name == field.name) {
                return Err(SchemaError::FieldCollision {
                    type_name: owner.to_string(),
                    field: field.name.to_string(),
                });
            }
            out.push(DocField {
                name: field.name.to_string(),
                doc_type,
                methods: field.rules.methods().to_vec(),
            });
        }
        Ok(())
    }
}
