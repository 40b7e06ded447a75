//! Presentation of resource values
//!
//! An [`Item`] wraps a value (or a list of items) with a name, description
//! and links. It is the usual [`Content`] a handler attaches to its response,
//! and renders as either JSON or an HTML section.

use crate::core::describe::Describe;
use crate::core::doc_type::DocType;
use crate::core::error::RenderError;
use crate::core::filter::filter_value;
use crate::core::link::{Link, sort_links};
use crate::core::request::Request;
use crate::html::form::link_node;
use crate::html::node::{Node, RenderContext};
use axum::http::Method as HttpMethod;
use serde::Serialize;
use serde_json::{Map, Value};

/// A value that knows how to present itself
pub trait Itemer: Send + 'static {
    fn item(&self, r: &Request) -> Item;
}

/// Anything the dispatcher can render in the negotiated media type
pub trait Content: Send + Sync {
    fn html_node(&self, ctx: &mut RenderContext) -> Result<Node, RenderError>;

    fn to_json(&self) -> Result<Value, RenderError>;
}

/// Payload of an item
#[derive(Debug, Clone)]
pub enum Properties {
    /// A serialized value, or the reason it could not be serialized
    Value(Result<Value, String>),
    List(Vec<Item>),
}

/// A value plus display metadata and links
#[derive(Debug, Clone)]
pub struct Item {
    pub name: String,
    pub desc: Vec<Vec<String>>,
    pub type_name: String,
    pub properties: Properties,
    pub links: Vec<Link>,
}

impl Item {
    /// Wrap `value`, showing only the fields it exposes to reads
    pub fn new<T: Describe + Serialize>(value: &T) -> Self {
        let shape = T::shape();
        let properties = serde_json::to_value(value)
            .map_err(|e| e.to_string())
            .and_then(|mut value| {
                let doc_type = DocType::new(&shape, &HttpMethod::GET).map_err(|e| e.to_string())?;
                filter_value(&doc_type, &mut value);
                Ok(value)
            });
        Self {
            name: String::new(),
            desc: Vec::new(),
            type_name: shape.name(),
            properties: Properties::Value(properties),
            links: Vec::new(),
        }
    }

    /// Wrap a list of items
    pub fn list(items: Vec<Item>) -> Self {
        Self {
            name: String::new(),
            desc: Vec::new(),
            type_name: "List".to_string(),
            properties: Properties::List(items),
            links: Vec::new(),
        }
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the description; each part is a header followed by paragraphs
    pub fn set_desc(mut self, desc: Vec<Vec<String>>) -> Self {
        self.desc = desc;
        self
    }

    pub fn add_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    fn properties_value(&self) -> Result<Value, RenderError> {
        match &self.properties {
            Properties::Value(Ok(value)) => Ok(value.clone()),
            Properties::Value(Err(message)) => Err(RenderError::Properties {
                type_name: self.type_name.clone(),
                message: message.clone(),
            }),
            Properties::List(items) => items
                .iter()
                .map(Item::to_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }
}

impl Content for Item {
    fn to_json(&self) -> Result<Value, RenderError> {
        let mut object = Map::new();
        object.insert("Name".to_string(), Value::String(self.name.clone()));
        object.insert("Properties".to_string(), self.properties_value()?);
        if !self.desc.is_empty() {
            object.insert("Desc".to_string(), serde_json::to_value(&self.desc)?);
        }
        object.insert("Type".to_string(), Value::String(self.type_name.clone()));
        let links = self
            .links
            .iter()
            .map(|l| Ok(serde_json::to_value(l.to_json()?)?))
            .collect::<Result<Vec<_>, RenderError>>()?;
        object.insert("Links".to_string(), Value::Array(links));
        Ok(Value::Object(object))
    }

    fn html_node(&self, ctx: &mut RenderContext) -> Result<Node, RenderError> {
        let mut self_link = None;
        let mut rest = Vec::new();
        for link in &self.links {
            if link.rel == "self" {
                self_link = Some(link.resolve()?);
            } else {
                rest.push(link.clone());
            }
        }
        sort_links(&mut rest);

        let mut section = Node::el("section", &[]);
        let header = section.add_el("header", &[]);
        match &self_link {
            Some(url) => {
                header.add_el("a", &[("href", url)]).add_text(&self.name);
            }
            None => {
                header.add_text(&self.name);
            }
        }

        if !self.desc.is_empty() {
            let desc = section.add_el("section", &[]);
            desc.add_el("header", &[]).add_text("Description");
            for part in self.desc.iter().filter(|p| !p.is_empty()) {
                let article = desc.add_el("article", &[]);
                article.add_el("header", &[]).add_text(&part[0]);
                for paragraph in &part[1..] {
                    article.add_el("p", &[]).add_text(paragraph);
                }
            }
        }

        let props = section.add_el("section", &[]);
        props.add_el("header", &[]).add_text("Properties");
        match &self.properties {
            Properties::List(items) => {
                let list = props.add_el("ul", &[]);
                for item in items {
                    let node = item.html_node(ctx)?;
                    list.add_el("ul", &[]).add_node(node);
                }
            }
            Properties::Value(_) => {
                let pretty = serde_json::to_string_pretty(&self.properties_value()?)?;
                props.add_el("article", &[]).add_el("pre", &[]).add_text(pretty);
            }
        }

        if !rest.is_empty() {
            let mut nav = Node::el("nav", &[]);
            for link in &rest {
                nav.add_node(link_node(link, ctx)?);
            }
            section.add_node(nav);
        }
        Ok(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::request::tests::request;
    use crate::impl_describe;
    use crate::server::route_table::RouteTable;
    use serde_json::json;

    #[derive(Serialize)]
    struct Book {
        #[serde(rename = "Title")]
        title: String,
        #[serde(rename = "Secret")]
        secret: String,
    }

    impl_describe!(Book {
        "Title": String [POST],
        "Secret": String | hidden,
    });

    fn book(title: &str) -> Book {
        Book {
            title: title.to_string(),
            secret: "shh".to_string(),
        }
    }

    fn routes() -> RouteTable {
        let mut routes = RouteTable::new();
        routes.register("Book.Create", "/Book", HttpMethod::POST).unwrap();
        routes.register("Book.Load", "/Book/{id}", HttpMethod::GET).unwrap();
        routes
    }

    fn bound(link: Link) -> Link {
        request(HttpMethod::GET, "/", &[("host", "b.example")], "", routes()).new_link(link)
    }

    #[test]
    fn test_json_layout() {
        let item = Item::new(&book("Dune"))
            .set_name("Dune")
            .add_link(bound(Link::new("self", "Book.Load").with_param("id", "1")));
        assert_eq!(
            item.to_json().unwrap(),
            json!({
                "Name": "Dune",
                "Properties": {"Title": "Dune"},
                "Type": "Book",
                "Links": [{"Rel": "self", "URL": "http://b.example/Book/1", "Method": "GET"}]
            })
        );
    }

    #[test]
    fn test_json_keeps_desc_when_present() {
        let item = Item::new(&book("Dune")).set_desc(vec![vec!["About".into(), "Sand".into()]]);
        let json = item.to_json().unwrap();
        assert_eq!(json["Desc"], json!([["About", "Sand"]]));
    }

    #[test]
    fn test_list_json() {
        let list = Item::list(vec![Item::new(&book("A")), Item::new(&book("B"))]).set_name("Books");
        let json = list.to_json().unwrap();
        assert_eq!(json["Type"], "List");
        assert_eq!(json["Properties"][1]["Properties"], json!({"Title": "B"}));
    }

    #[test]
    fn test_html_layout() {
        let item = Item::new(&book("Dune"))
            .set_name("Dune")
            .set_desc(vec![vec!["About".into(), "Sand".into(), "Worms".into()], vec![]])
            .add_link(bound(
                Link::new("create", "Book.Create")
                    .with_method(HttpMethod::POST)
                    .with_type::<Book>(),
            ))
            .add_link(bound(Link::new("self", "Book.Load").with_param("id", "1")))
            .add_link(bound(Link::new("other", "Book.Load").with_param("id", "2")));
        let node = item.html_node(&mut RenderContext::new()).unwrap();

        let header = node.children().next().unwrap();
        assert_eq!(header.find("a").unwrap().attr("href"), Some("http://b.example/Book/1"));

        let sections: Vec<_> = node.children().filter(|c| c.tag() == "section").collect();
        assert_eq!(sections.len(), 2);
        let mut articles = Vec::new();
        sections[0].find_all("article", &mut articles);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].text_content(), "AboutSandWorms");
        assert_eq!(
            sections[1].find("pre").unwrap().text_content(),
            "{\n  \"Title\": \"Dune\"\n}"
        );

        let nav = node.find("nav").unwrap();
        let tags: Vec<_> = nav.children().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["a", "div"]);
    }

    #[test]
    fn test_html_without_self_link() {
        let item = Item::new(&book("Dune")).set_name("Dune");
        let node = item.html_node(&mut RenderContext::new()).unwrap();
        let header = node.children().next().unwrap();
        assert!(header.find("a").is_none());
        assert_eq!(header.text_content(), "Dune");
        assert!(node.find("nav").is_none());
    }

    #[test]
    fn test_html_list_nests_items() {
        let list = Item::list(vec![Item::new(&book("A")).set_name("A")]);
        let node = list.html_node(&mut RenderContext::new()).unwrap();
        let ul = node.find("ul").unwrap();
        assert_eq!(ul.children().next().unwrap().tag(), "ul");
        assert!(ul.find("section").is_some());
    }

    #[test]
    fn test_unbound_link_fails_rendering() {
        let item = Item::new(&book("Dune")).add_link(Link::new("self", "Book.Load"));
        assert!(item.to_json().is_err());
    }
}
