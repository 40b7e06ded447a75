//! Minimal HTML element tree

use std::fmt::Write;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// An HTML element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Child>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Child {
    Element(Node),
    Text(String),
}

impl Node {
    /// A new element with `attrs` as name/value pairs
    pub fn el(tag: &str, attrs: &[(&str, &str)]) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
        self
    }

    /// Append a child element and return it
    pub fn add_el(&mut self, tag: &str, attrs: &[(&str, &str)]) -> &mut Node {
        self.add_node(Node::el(tag, attrs));
        match self.children.last_mut() {
            Some(Child::Element(node)) => node,
            _ => unreachable!("an element was just appended"),
        }
    }

    pub fn add_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.children.push(Child::Element(node));
        self
    }

    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|c| match c {
            Child::Element(node) => Some(node),
            Child::Text(_) => None,
        })
    }

    /// First descendant (or self) with tag `tag`, depth first
    pub fn find(&self, tag: &str) -> Option<&Node> {
        if self.tag == tag {
            return Some(self);
        }
        self.children().find_map(|c| c.find(tag))
    }

    /// Every descendant (or self) with tag `tag`, depth first
    pub fn find_all<'a>(&'a self, tag: &str, out: &mut Vec<&'a Node>) {
        if self.tag == tag {
            out.push(self);
        }
        for child in self.children() {
            child.find_all(tag, out);
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Child::Element(node) => out.push_str(&node.text_content()),
                Child::Text(text) => out.push_str(text),
            }
        }
        out
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    pub fn render_into(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, tera::escape_html(value));
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }
        let raw = RAW_TEXT_ELEMENTS.contains(&self.tag.as_str());
        for child in &self.children {
            match child {
                Child::Element(node) => node.render_into(out),
                Child::Text(text) if raw => out.push_str(text),
                Child::Text(text) => out.push_str(&tera::escape_html(text)),
            }
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

/// State shared while rendering one page
#[derive(Debug, Default)]
pub struct RenderContext {
    next_id: u64,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page-unique element id starting with `prefix`
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested() {
        let mut section = Node::el("section", &[]);
        section.add_el("header", &[]).add_text("Title");
        section
            .add_el("a", &[("href", "/User/1?x=1&y=2")])
            .add_text("<self>");
        assert_eq!(
            section.render(),
            "<section><header>Title</header><a href=\"&#x2F;User&#x2F;1?x=1&amp;y=2\">&lt;self&gt;</a></section>"
        );
    }

    #[test]
    fn test_void_and_raw_elements() {
        let mut head = Node::el("head", &[]);
        head.add_el("meta", &[("charset", "utf-8")]);
        head.add_el("script", &[]).add_text("if (a < b) {}");
        assert_eq!(
            head.render(),
            "<head><meta charset=\"utf-8\"><script>if (a < b) {}</script></head>"
        );
    }

    #[test]
    fn test_find_and_text() {
        let mut nav = Node::el("nav", &[]);
        nav.add_el("a", &[("href", "x")]).add_text("one");
        nav.add_el("div", &[]).add_el("a", &[]).add_text("two");
        assert_eq!(nav.find("a").unwrap().attr("href"), Some("x"));
        let mut anchors = Vec::new();
        nav.find_all("a", &mut anchors);
        assert_eq!(anchors.len(), 2);
        assert_eq!(nav.text_content(), "onetwo");
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut input = Node::el("input", &[("type", "text")]);
        input.set_attr("type", "number").set_attr("step", "1");
        assert_eq!(input.attr("type"), Some("number"));
        assert_eq!(input.attr("step"), Some("1"));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ctx = RenderContext::new();
        assert_eq!(ctx.next_id("form"), "form1");
        assert_eq!(ctx.next_id("button"), "button2");
    }
}
