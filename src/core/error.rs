//! Typed errors for restbind
//!
//! Errors fall into a few families:
//!
//! - [`SchemaError`]: a type cannot be described (configuration errors)
//! - [`DecodeError`]: a request body could not be filtered and bound
//! - [`BindError`]: a resource or route could not be registered
//! - [`RouteError`] / [`LinkError`]: a named route could not be turned into a URL
//! - [`RenderError`]: content could not be rendered as HTML or JSON
//! - [`HttpError`]: an explicit body and status chosen by a handler
//!
//! [`HandlerError`] is what handlers return; it knows how to become an HTTP
//! response.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn load_user(_w: ResponseWriter, r: Request) -> Result<Option<User>, HandlerError> {
//!     let id = r.var("id").ok_or_else(|| HttpError::new("missing id", StatusCode::BAD_REQUEST))?;
//!     Ok(Some(store.get(&Key::new("User", id)).await?))
//! }
//! ```

use crate::storage::StoreError;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A type, or a combination of field rules, cannot be described
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("untranslatable type {type_name}")]
    Untranslatable { type_name: String },

    #[error("recursive type {type_name} cannot be described")]
    Recursive { type_name: String },

    #[error("field {field} appears more than once in {type_name}")]
    FieldCollision { type_name: String, field: String },

    #[error("embedded field {field} of {type_name} is not a struct")]
    EmbeddedNotStruct { type_name: String, field: String },

    #[error("countdown field {field} of {type_name} is not a duration")]
    CountdownNotDuration { type_name: String, field: String },

    #[error("map key type {type_name} is not representable as a string")]
    MapKey { type_name: String },

    #[error("invalid method tag {tag:?}")]
    InvalidMethodTag { tag: String },
}

/// A request payload could not be filtered and bound onto a typed value
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON payload: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("can only copy a JSON object into a struct")]
    NotAnObject,

    #[error("can only copy into a struct, {type_name} is not one")]
    NotAStruct { type_name: String },

    #[error("unsupported Content-Type {0}")]
    UnsupportedMedia(String),

    #[error("unsupported character set {0}")]
    UnsupportedCharset(String),

    #[error("payload does not match the destination type: {0}")]
    Bind(#[source] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl DecodeError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DecodeError::UnsupportedMedia(_) | DecodeError::UnsupportedCharset(_) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            DecodeError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// A named route could not be registered or resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no route named {0:?}")]
    UnknownRoute(String),

    #[error("route {route:?} needs path parameter {param:?}")]
    MissingParam { route: String, param: String },

    #[error("route {0:?} is already registered")]
    Duplicate(String),

    #[error("invalid base URL {0:?}")]
    InvalidBase(String),
}

/// A link could not be resolved or described
#[derive(Debug, Error)]
pub enum LinkError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("link {rel:?} was not created through a request")]
    Unbound { rel: String },

    #[error("link decorator failed: {0}")]
    Decorator(String),
}

/// Content could not be rendered
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("failed to serialize {type_name}: {message}")]
    Properties { type_name: String, message: String },

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render template: {0}")]
    Template(#[from] tera::Error),

    #[error("head callback failed: {0}")]
    Head(String),
}

/// A resource or route could not be bound
#[derive(Debug, Error)]
pub enum BindError {
    #[error("route {0:?} is already bound")]
    DuplicateRoute(String),

    #[error("{method} {pattern} is already served by another route")]
    OverlappingRoute { pattern: String, method: String },

    #[error("type mismatch for resource {resource}: bound as {expected}, got {found}")]
    TypeMismatch {
        resource: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("resource {resource} cannot be described for {method}: {source}")]
    Schema {
        resource: String,
        method: String,
        #[source]
        source: SchemaError,
    },
}

/// An explicit HTTP error chosen by a handler, bypassing generic mapping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{body}: {status}")]
pub struct HttpError {
    pub body: String,
    pub status: StatusCode,
}

impl HttpError {
    pub fn new(body: impl Into<String>, status: StatusCode) -> Self {
        Self {
            body: body.into(),
            status,
        }
    }
}

/// Error returned by handlers, filters and post-processors
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// Get the HTTP status code for this error
    ///
    /// Storage not-found errors (and multi-errors made only of not-found
    /// entries) map to 404, decode errors to 4xx, explicit HTTP errors to
    /// their own status, and everything else to 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::Http(e) => e.status,
            HandlerError::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            HandlerError::Decode(e) => e.status_code(),
            HandlerError::Other(e) => match e.downcast_ref::<StoreError>() {
                Some(store) if store.is_not_found() => StatusCode::NOT_FOUND,
                _ => match e.downcast_ref::<HttpError>() {
                    Some(http) => http.status,
                    None => StatusCode::INTERNAL_SERVER_ERROR,
                },
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The response body for this error
    pub fn body(&self) -> String {
        match self {
            HandlerError::Http(e) => e.body.clone(),
            HandlerError::Other(e) => match e.downcast_ref::<HttpError>() {
                Some(http) => http.body.clone(),
                None => e.to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.body();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request rejected");
        }
        (status, [(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        HandlerError::Http(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MultiError;

    #[test]
    fn test_http_error_keeps_status_and_body() {
        let err = HandlerError::from(HttpError::new("nope", StatusCode::FORBIDDEN));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.body(), "nope");
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = HandlerError::from(StoreError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_multi_error_of_not_found_maps_to_404() {
        let err = HandlerError::from(StoreError::Multi(MultiError(vec![
            None,
            Some(StoreError::NotFound),
        ])));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_mixed_multi_error_maps_to_500() {
        let err = HandlerError::from(StoreError::Multi(MultiError(vec![
            Some(StoreError::NotFound),
            Some(StoreError::Backend("disk on fire".to_string())),
        ])));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_decode_errors_are_client_errors() {
        let err = HandlerError::from(DecodeError::NotAnObject);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err = HandlerError::from(DecodeError::UnsupportedMedia("text/xml".to_string()));
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_uncategorized_errors_map_to_500_with_message() {
        let err = HandlerError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(), "boom");
    }

    #[test]
    fn test_anyhow_wrapped_not_found_maps_to_404() {
        let err = HandlerError::from(anyhow::Error::from(StoreError::NotFound));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_into_response_status() {
        let response = HandlerError::from(StoreError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
