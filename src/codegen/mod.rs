//! Client code generation
//!
//! Bound resources can be projected into client stubs. The only target is
//! Java: Retrofit service interfaces plus plain classes for every described
//! struct, see [`JavaGenerator`].

pub mod java;

pub use java::{JavaGenerator, write_to_dir};

use crate::core::error::{RouteError, SchemaError};
use std::path::PathBuf;
use thiserror::Error;

/// Client code could not be generated or written
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("failed to render template: {0}")]
    Template(#[from] tera::Error),

    #[error("two different classes are named {name}")]
    NameCollision { name: String },

    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("failed to write generated code: {0}")]
    Io(#[from] std::io::Error),
}
