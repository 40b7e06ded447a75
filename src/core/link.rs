//! Hyperlinks between resources
//!
//! A [`Link`] names a route rather than a URL. It is bound to a request
//! with [`Request::new_link`](crate::core::request::Request::new_link), which
//! captures the scheme, host and link decorators, and is only resolved when
//! rendered.

use crate::core::describe::{Describe, ShapeFn};
use crate::core::doc_type::DocType;
use crate::core::error::{LinkError, SchemaError};
use crate::core::method::has_body;
use crate::core::schema::JsonSchema;
use crate::server::route_table::RouteTable;
use axum::http::Method as HttpMethod;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Hook mutating every link URL resolved for a request
pub type LinkDecorator = Arc<dyn Fn(&Link, &mut Url) -> Result<(), LinkError> + Send + Sync>;

/// A link to a named route
#[derive(Clone)]
pub struct Link {
    pub rel: String,
    pub route: String,
    pub route_params: Vec<(String, String)>,
    pub query_params: Vec<(String, String)>,
    pub method: HttpMethod,
    /// Type whose writable schema is embedded for body-bearing methods
    pub shape: Option<ShapeFn>,
    base: Option<LinkBase>,
}

#[derive(Clone)]
pub(crate) struct LinkBase {
    pub scheme: String,
    pub host: String,
    pub decorators: Vec<LinkDecorator>,
    pub routes: Arc<RouteTable>,
}

/// JSON form of a link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkJson {
    #[serde(rename = "Rel")]
    pub rel: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "JSONSchema", skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<JsonSchema>,
}

impl Link {
    /// A GET link to `route`
    pub fn new(rel: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            route: route.into(),
            route_params: Vec::new(),
            query_params: Vec::new(),
            method: HttpMethod::GET,
            shape: None,
            base: None,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_params.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    /// Embed the writable schema of `T` for this link's method
    pub fn with_type<T: Describe + ?Sized>(mut self) -> Self {
        self.shape = Some(T::shape);
        self
    }

    pub(crate) fn bind(mut self, base: LinkBase) -> Self {
        self.base = Some(base);
        self
    }

    pub fn is_bound(&self) -> bool {
        self.base.is_some()
    }

    /// Resolve to an absolute URL
    pub fn resolve(&self) -> Result<String, LinkError> {
        let base = self.base.as_ref().ok_or_else(|| LinkError::Unbound {
            rel: self.rel.clone(),
        })?;
        let mut url = base
            .routes
            .url(&self.route, &self.route_params, &base.scheme, &base.host)?;
        if !self.query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query_params);
        }
        for decorator in &base.decorators {
            decorator(self, &mut url)?;
        }
        Ok(url.to_string())
    }

    /// Descriptor of the linked type for this link's method
    pub fn doc_type(&self) -> Result<Option<DocType>, SchemaError> {
        self.shape
            .map(|shape| DocType::new(&shape(), &self.method))
            .transpose()
    }

    /// Schema of the fields a body may carry, when the method takes a body
    /// and at least one field is writable
    pub fn writable_schema(&self) -> Result<Option<JsonSchema>, SchemaError> {
        if !has_body(&self.method) {
            return Ok(None);
        }
        Ok(self
            .doc_type()?
            .filter(DocType::has_fields)
            .map(|d| d.to_json_schema()))
    }

    pub fn to_json(&self) -> Result<LinkJson, LinkError> {
        Ok(LinkJson {
            rel: self.rel.clone(),
            url: self.resolve()?,
            method: self.method.to_string(),
            json_schema: self.writable_schema()?,
        })
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("rel", &self.rel)
            .field("route", &self.route)
            .field("route_params", &self.route_params)
            .field("query_params", &self.query_params)
            .field("method", &self.method)
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

/// Order links for display: GET links first, then by relation
pub fn sort_links(links: &mut [Link]) {
    links.sort_by(|a, b| {
        (a.method != HttpMethod::GET, &a.rel).cmp(&(b.method != HttpMethod::GET, &b.rel))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_describe;
    use serde_json::json;

    struct Game;
    impl_describe!(Game {
        "Desc": String [POST],
        "Started": bool,
    });

    fn base(decorators: Vec<LinkDecorator>) -> LinkBase {
        let mut routes = RouteTable::new();
        routes.register("Game.Create", "/Game", HttpMethod::POST).unwrap();
        routes.register("Game.Load", "/Game/{id}", HttpMethod::GET).unwrap();
        routes.register("Game.Update", "/Game/{id}", HttpMethod::PUT).unwrap();
        LinkBase {
            scheme: "http".to_string(),
            host: "example.com".to_string(),
            decorators,
            routes: Arc::new(routes),
        }
    }

    #[test]
    fn test_resolve() {
        let link = Link::new("self", "Game.Load")
            .with_param("id", "7")
            .with_query("page", "2")
            .bind(base(Vec::new()));
        assert_eq!(link.resolve().unwrap(), "http://example.com/Game/7?page=2");
    }

    #[test]
    fn test_unbound_link_fails() {
        let link = Link::new("self", "Game.Load").with_param("id", "7");
        assert!(matches!(link.resolve(), Err(LinkError::Unbound { .. })));
    }

    #[test]
    fn test_unknown_route_fails() {
        let link = Link::new("self", "Game.Nope").bind(base(Vec::new()));
        let err = link.resolve().unwrap_err();
        assert_eq!(err.to_string(), "no route named \"Game.Nope\"");
    }

    #[test]
    fn test_decorators_run_in_order() {
        let first: LinkDecorator = Arc::new(|_: &Link, url: &mut Url| {
            url.query_pairs_mut().append_pair("a", "1");
            Ok(())
        });
        let second: LinkDecorator = Arc::new(|link: &Link, url: &mut Url| {
            url.query_pairs_mut().append_pair("rel", &link.rel);
            Ok(())
        });
        let link = Link::new("self", "Game.Load")
            .with_param("id", "1")
            .bind(base(vec![first, second]));
        assert_eq!(
            link.resolve().unwrap(),
            "http://example.com/Game/1?a=1&rel=self"
        );
    }

    #[test]
    fn test_failing_decorator_aborts() {
        let failing: LinkDecorator =
            Arc::new(|_: &Link, _: &mut Url| Err(LinkError::Decorator("nope".into())));
        let link = Link::new("self", "Game.Load")
            .with_param("id", "1")
            .bind(base(vec![failing]));
        assert!(matches!(link.resolve(), Err(LinkError::Decorator(_))));
    }

    // === JSON ===

    #[test]
    fn test_json_embeds_writable_schema() {
        let link = Link::new("create", "Game.Create")
            .with_method(HttpMethod::POST)
            .with_type::<Game>()
            .bind(base(Vec::new()));
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            json!({
                "Rel": "create",
                "URL": "http://example.com/Game",
                "Method": "POST",
                "JSONSchema": {
                    "type": "object",
                    "properties": {"Desc": {"type": "string", "title": "Desc"}}
                }
            })
        );
    }

    #[test]
    fn test_json_omits_schema_without_writable_fields() {
        let link = Link::new("update", "Game.Update")
            .with_method(HttpMethod::PUT)
            .with_param("id", "1")
            .with_type::<Game>()
            .bind(base(Vec::new()));
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            json!({"Rel": "update", "URL": "http://example.com/Game/1", "Method": "PUT"})
        );
    }

    #[test]
    fn test_json_omits_schema_for_get() {
        let link = Link::new("self", "Game.Load")
            .with_param("id", "1")
            .with_type::<Game>()
            .bind(base(Vec::new()));
        assert!(link.to_json().unwrap().json_schema.is_none());
    }

    #[test]
    fn test_sort_links() {
        let mut links = vec![
            Link::new("update", "r").with_method(HttpMethod::PUT),
            Link::new("b", "r"),
            Link::new("create", "r").with_method(HttpMethod::POST),
            Link::new("a", "r"),
        ];
        sort_links(&mut links);
        let rels: Vec<_> = links.iter().map(|l| l.rel.as_str()).collect();
        assert_eq!(rels, vec!["a", "b", "create", "update"]);
    }
}
