//! Core module containing the resource model, schemas and request context

pub mod caching;
pub mod describe;
pub mod doc_type;
pub mod error;
pub mod filter;
pub mod item;
pub mod key;
pub mod link;
pub mod media;
pub mod method;
pub mod request;
pub mod resource;
pub mod response;
pub mod schema;

pub use caching::{etag_cached, version_etag};
pub use describe::{Describe, FieldRules, StructShape, TypeShape};
pub use doc_type::{DocField, DocKind, DocType};
pub use error::{
    BindError, DecodeError, HandlerError, HttpError, LinkError, RenderError, RouteError,
    SchemaError,
};
pub use filter::{bind_filtered, filter_value};
pub use item::{Content, Item, Itemer, Properties};
pub use key::Key;
pub use link::{Link, LinkDecorator, LinkJson, sort_links};
pub use media::{Media, negotiate};
pub use method::Method;
pub use request::Request;
pub use resource::{Handler, Lister, ListerInfo, Resource, ResourceInfo, RouteHandler};
pub use response::ResponseWriter;
pub use schema::JsonSchema;
