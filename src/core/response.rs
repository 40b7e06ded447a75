//! Response sink handed to handlers

use crate::core::item::Content;
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Collects what a handler wants to send back
///
/// Handlers usually attach [`Content`] (an item or a list) and let the
/// dispatcher render it in the negotiated media type. A handler may instead
/// write a raw status and body, which is sent as is when no content is set.
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct ResponseWriter {
    state: Arc<Mutex<ResponseState>>,
}

#[derive(Default)]
pub(crate) struct ResponseState {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub content: Option<Box<dyn Content>>,
    pub body: Option<Bytes>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ResponseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach content to be rendered as HTML or JSON
    pub fn set_content(&self, content: impl Content + 'static) {
        self.lock().content = Some(Box::new(content));
    }

    pub fn has_content(&self) -> bool {
        self.lock().content.is_some()
    }

    pub fn set_status(&self, status: StatusCode) {
        self.lock().status = Some(status);
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.lock().status
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.lock().headers.insert(name, value);
    }

    pub fn header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.lock().headers.get(name).cloned()
    }

    /// Write a raw status and body
    pub fn write(&self, status: StatusCode, body: impl Into<Bytes>) {
        let mut state = self.lock();
        state.status = Some(status);
        state.body = Some(body.into());
    }

    pub(crate) fn take(&self) -> ResponseState {
        std::mem::take(&mut *self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::ETAG;

    #[test]
    fn test_clones_share_state() {
        let w = ResponseWriter::new();
        let other = w.clone();
        other.write(StatusCode::NOT_FOUND, "not found");
        other.insert_header(ETAG, HeaderValue::from_static("W/\"x\""));

        assert_eq!(w.status(), Some(StatusCode::NOT_FOUND));
        let state = w.take();
        assert_eq!(state.body.as_deref(), Some(&b"not found"[..]));
        assert_eq!(state.headers[ETAG], "W/\"x\"");
        assert!(w.status().is_none());
    }
}
