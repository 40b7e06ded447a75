//! Per-request context handed to filters, handlers and post-processors

use crate::core::describe::Describe;
use crate::core::error::DecodeError;
use crate::core::filter::bind_filtered;
use crate::core::link::{Link, LinkBase, LinkDecorator};
use crate::core::media::{Media, Negotiated, check_json_body};
use crate::server::route_table::RouteTable;
use axum::body::Bytes;
use axum::http::header::HOST;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method as HttpMethod, Uri};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An inbound request
///
/// Cheap to clone; clones share the scratch values and link decorators.
#[derive(Clone)]
pub struct Request {
    inner: Arc<RequestInner>,
}

struct RequestInner {
    parts: Parts,
    body: Bytes,
    vars: HashMap<String, String>,
    negotiated: Negotiated,
    routes: Arc<RouteTable>,
    values: Mutex<HashMap<String, Value>>,
    decorators: Mutex<Vec<LinkDecorator>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Request {
    pub(crate) fn new(
        parts: Parts,
        body: Bytes,
        vars: HashMap<String, String>,
        negotiated: Negotiated,
        routes: Arc<RouteTable>,
    ) -> Self {
        Self {
            inner: Arc::new(RequestInner {
                parts,
                body,
                vars,
                negotiated,
                routes,
                values: Mutex::new(HashMap::new()),
                decorators: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn method(&self) -> &HttpMethod {
        &self.inner.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.inner.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.parts.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }

    /// Path variables of the matched route
    pub fn vars(&self) -> &HashMap<String, String> {
        &self.inner.vars
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.inner.vars.get(name).map(String::as_str)
    }

    /// First value of query parameter `name`
    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.uri().query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Negotiated response media
    pub fn media(&self) -> Media {
        self.inner.negotiated.media
    }

    pub fn charset(&self) -> &str {
        &self.inner.negotiated.charset
    }

    /// Scratch value shared between filters and handlers
    pub fn value(&self, key: &str) -> Option<Value> {
        lock(&self.inner.values).get(key).cloned()
    }

    pub fn set_value(&self, key: impl Into<String>, value: impl Serialize) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        lock(&self.inner.values).insert(key.into(), value);
        Ok(())
    }

    /// Register a decorator applied to every link created through
    /// [`new_link`](Self::new_link) from now on
    pub fn decorate_links(&self, decorator: LinkDecorator) {
        lock(&self.inner.decorators).push(decorator);
    }

    /// Bind `link` to this request's scheme, host and decorators
    pub fn new_link(&self, link: Link) -> Link {
        let headers = self.headers();
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| self.uri().scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());
        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| self.uri().authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        link.bind(LinkBase {
            scheme,
            host,
            decorators: lock(&self.inner.decorators).clone(),
            routes: self.inner.routes.clone(),
        })
    }

    /// Decode the JSON body into `T`, keeping only the fields `T` accepts for
    /// this request's method
    pub fn copy<T: Describe + DeserializeOwned>(&self) -> Result<T, DecodeError> {
        self.copy_for(&self.inner.parts.method)
    }

    /// Decode the JSON body into `T`, keeping only the fields `T` accepts for
    /// `method`
    pub fn copy_for<T: Describe + DeserializeOwned>(
        &self,
        method: &HttpMethod,
    ) -> Result<T, DecodeError> {
        check_json_body(self.headers())?;
        bind_filtered(&self.inner.body, method)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::impl_describe;
    use serde::Deserialize;
    use serde_json::json;

    /// Build a request against `routes` for unit tests
    pub(crate) fn request(
        method: HttpMethod,
        uri: &str,
        headers: &[(&str, &str)],
        body: &str,
        routes: RouteTable,
    ) -> Request {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        Request::new(
            parts,
            Bytes::from(body.to_string()),
            HashMap::new(),
            Negotiated {
                media: Media::Json,
                charset: "utf-8".to_string(),
            },
            Arc::new(routes),
        )
    }

    fn routes() -> RouteTable {
        let mut routes = RouteTable::new();
        routes.register("Note.Load", "/Note/{id}", HttpMethod::GET).unwrap();
        routes
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Note {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "Owner")]
        owner: String,
    }

    impl_describe!(Note {
        "Text": String [POST, PUT],
        "Owner": String [POST],
    });

    #[test]
    fn test_new_link_uses_host_and_forwarded_proto() {
        let r = request(
            HttpMethod::GET,
            "/Note/1",
            &[("host", "notes.example"), ("x-forwarded-proto", "https")],
            "",
            routes(),
        );
        let link = r.new_link(Link::new("self", "Note.Load").with_param("id", "1"));
        assert_eq!(link.resolve().unwrap(), "https://notes.example/Note/1");
    }

    #[test]
    fn test_new_link_defaults() {
        let r = request(HttpMethod::GET, "/Note/1", &[], "", routes());
        let link = r.new_link(Link::new("self", "Note.Load").with_param("id", "1"));
        assert_eq!(link.resolve().unwrap(), "http://localhost/Note/1");
    }

    #[test]
    fn test_decorators_are_captured_at_link_creation() {
        let r = request(HttpMethod::GET, "/", &[("host", "h")], "", routes());
        let before = r.new_link(Link::new("self", "Note.Load").with_param("id", "1"));
        r.decorate_links(Arc::new(|_: &Link, url: &mut url::Url| {
            url.set_host(Some("cdn.example")).map_err(|e| {
                crate::core::error::LinkError::Decorator(e.to_string())
            })
        }));
        let after = r.new_link(Link::new("self", "Note.Load").with_param("id", "1"));
        assert_eq!(before.resolve().unwrap(), "http://h/Note/1");
        assert_eq!(after.resolve().unwrap(), "http://cdn.example/Note/1");
    }

    #[test]
    fn test_values_are_shared_between_clones() {
        let r = request(HttpMethod::GET, "/", &[], "", routes());
        let clone = r.clone();
        clone.set_value("user", json!({"id": 1})).unwrap();
        assert_eq!(r.value("user"), Some(json!({"id": 1})));
        assert_eq!(r.value("missing"), None);
    }

    #[test]
    fn test_query() {
        let r = request(HttpMethod::GET, "/?q=a%20b&q=c", &[], "", routes());
        assert_eq!(r.query("q").as_deref(), Some("a b"));
        assert_eq!(r.query("x"), None);
    }

    #[test]
    fn test_copy_filters_by_request_method() {
        let body = r#"{"Text":"hi","Owner":"mallory"}"#;
        let r = request(
            HttpMethod::PUT,
            "/Note/1",
            &[("content-type", "application/json; charset=utf-8")],
            body,
            routes(),
        );
        let note: Note = r.copy().unwrap();
        assert_eq!(
            note,
            Note {
                text: "hi".to_string(),
                owner: String::new()
            }
        );

        let note: Note = r.copy_for(&HttpMethod::POST).unwrap();
        assert_eq!(note.owner, "mallory");
    }

    #[test]
    fn test_copy_requires_json() {
        let r = request(
            HttpMethod::POST,
            "/Note",
            &[("content-type", "text/plain")],
            "{}",
            routes(),
        );
        assert!(matches!(
            r.copy::<Note>(),
            Err(DecodeError::UnsupportedMedia(_))
        ));
    }
}
