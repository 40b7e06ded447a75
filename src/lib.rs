//! # Restbind
//!
//! Hypermedia REST resources on top of axum.
//!
//! ## Features
//!
//! - **Method-aware schemas**: one field table per type decides what each HTTP method may read or write
//! - **Filtered decoding**: request bodies only ever populate the fields their method allows
//! - **Content negotiation**: every resource renders as JSON or as a browsable HTML page
//! - **Typed links**: links carry the schema of the body they expect and render as forms
//! - **Client generation**: Retrofit service interfaces and model classes for Java clients
//! - **Sealed registry**: once built, a server's routes and resources are read-only
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use restbind::prelude::*;
//!
//! #[derive(Serialize, Deserialize, Default, Clone)]
//! #[serde(default)]
//! struct User {
//!     #[serde(rename = "Id")]
//!     id: Key,
//!     #[serde(rename = "Name")]
//!     name: String,
//! }
//!
//! impl_describe!(User {
//!     "Id": Key,
//!     "Name": String [POST],
//! });
//!
//! impl Itemer for User {
//!     fn item(&self, r: &Request) -> Item {
//!         Item::new(self).set_name(self.name.clone()).add_link(
//!             r.new_link(Resource::<User>::link("self", Method::Load, &[("id", self.id.id())])),
//!         )
//!     }
//! }
//!
//! let app = ServerBuilder::new()
//!     .register_resource(Resource::<User>::new().load(load_user).create(create_user))?
//!     .build()?;
//! ```

pub mod codegen;
pub mod config;
pub mod core;
pub mod html;
pub mod server;
pub mod storage;

/// HTTP method type used in field tables and route bindings
pub use axum::http::Method as HttpMethod;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        Content, Describe, FieldRules, Handler, HandlerError, HttpError, Item, Itemer, Key, Link,
        Lister, Media, Method, Properties, Request, Resource, ResponseWriter, RouteHandler,
        StructShape, TypeShape, etag_cached,
    };

    // === Macros ===
    pub use crate::impl_describe;

    // === Storage ===
    pub use crate::storage::{InMemoryStore, Store, StoreError};

    // === Config ===
    pub use crate::config::ServerConfig;

    // === Server ===
    pub use crate::server::{ServerBuilder, ServerHost};

    // === Codegen ===
    pub use crate::codegen::{CodegenError, write_to_dir};

    // === External dependencies ===
    pub use crate::HttpMethod;
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};

    // === Axum ===
    pub use axum::{Router, http::StatusCode};
}
