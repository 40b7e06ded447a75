//! HTML rendering of links
//!
//! GET links become anchors. POST and PUT links whose type has writable
//! fields become a self-contained form with one input per field and a script
//! that serializes the inputs by kind and submits them as JSON. Any other
//! link becomes a button sending a bodyless request.

use crate::core::doc_type::{DocField, DocKind, DocType};
use crate::core::error::{LinkError, RenderError};
use crate::core::link::Link;
use crate::core::method::has_body;
use crate::html::node::{Node, RenderContext};
use axum::http::Method as HttpMethod;
use serde::Serialize;
use tera::{Context, Tera};

const FORM_SCRIPT: &str = r#"
(function() {
  var form = document.getElementById({{ form_id }});
  var fields = {{ fields }};
  function coerce(kind, raw) {
    if (kind == "integer") { return parseInt(raw, 10); }
    if (kind == "number") { return parseFloat(raw); }
    if (kind == "checkbox") { return raw == "true"; }
    return raw;
  }
  form.addEventListener("submit", function(ev) {
    ev.preventDefault();
    var values = {};
    try {
      fields.forEach(function(field) {
        var input = form.elements[field.name];
        if (field.kind == "checkbox") {
          values[field.name] = input.checked;
        } else if (input.value === "") {
          return;
        } else if (field.kind == "list") {
          values[field.name] = input.value.split(",").map(function(part) {
            return coerce(field.elem, part.trim());
          });
        } else if (field.kind == "json") {
          values[field.name] = JSON.parse(input.value);
        } else if (field.kind == "datetime") {
          values[field.name] = new Date(input.value).toISOString();
        } else {
          values[field.name] = coerce(field.kind, input.value);
        }
      });
    } catch (err) {
      alert(err);
      return;
    }
    var req = new XMLHttpRequest();
    req.addEventListener("readystatechange", function() {
      if (req.readyState == 4) {
        if (req.status > 199 && req.status < 300) {
          alert("done");
        } else {
          alert(req.responseText);
        }
      }
    });
    req.open({{ method }}, {{ url }});
    req.setRequestHeader("Content-Type", "application/json; charset=utf-8");
    req.send(JSON.stringify(values));
  });
})();
"#;

const BUTTON_SCRIPT: &str = r#"
document.getElementById({{ button_id }}).addEventListener("click", function(ev) {
  var req = new XMLHttpRequest();
  req.addEventListener("readystatechange", function() {
    if (req.readyState == 4) {
      if (req.status > 199 && req.status < 300) {
        alert("done");
      } else {
        alert(req.responseText);
      }
    }
  });
  req.open({{ method }}, {{ url }});
  req.send();
});
"#;

#[derive(Serialize)]
struct FieldSpec<'a> {
    name: &'a str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    elem: Option<&'static str>,
}

/// Input kind used by the form script
fn input_kind(doc_type: &DocType) -> &'static str {
    match doc_type.kind {
        DocKind::String | DocKind::Key => "text",
        DocKind::Integer | DocKind::Duration | DocKind::Countdown => "integer",
        DocKind::Number => "number",
        DocKind::Bool => "checkbox",
        DocKind::Time => "datetime",
        DocKind::Slice => match doc_type.elem.as_deref() {
            Some(elem) if elem.kind.is_scalar() && elem.kind != DocKind::Time => "list",
            _ => "json",
        },
        DocKind::Struct | DocKind::Map => "json",
    }
}

fn input_node(field: &DocField, id: &str) -> Node {
    let name = field.name.as_str();
    match input_kind(&field.doc_type) {
        "integer" => Node::el("input", &[("type", "number"), ("step", "1"), ("name", name), ("id", id)]),
        "number" => Node::el("input", &[("type", "number"), ("step", "any"), ("name", name), ("id", id)]),
        "checkbox" => Node::el("input", &[("type", "checkbox"), ("name", name), ("id", id)]),
        "datetime" => Node::el("input", &[("type", "datetime-local"), ("name", name), ("id", id)]),
        "list" => Node::el(
            "input",
            &[("type", "text"), ("name", name), ("id", id), ("placeholder", "comma separated")],
        ),
        "json" => Node::el("textarea", &[("name", name), ("id", id), ("placeholder", "JSON")]),
        _ => Node::el("input", &[("type", "text"), ("name", name), ("id", id)]),
    }
}

/// JSON-encode `value` for inclusion in an inline script
fn script_value(value: &impl Serialize) -> Result<String, RenderError> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn render_script(template: &str, values: &[(&str, String)]) -> Result<String, RenderError> {
    let mut context = Context::new();
    for (name, value) in values {
        context.insert(*name, value);
    }
    Ok(Tera::one_off(template, &context, false)?)
}

/// Render `link` as an HTML node
pub fn link_node(link: &Link, ctx: &mut RenderContext) -> Result<Node, RenderError> {
    let url = link.resolve()?;
    if link.method == HttpMethod::GET {
        let mut anchor = Node::el("a", &[("href", &url)]);
        anchor.add_text(&link.rel);
        return Ok(anchor);
    }

    let doc_type = if has_body(&link.method) {
        link.doc_type().map_err(LinkError::from)?
    } else {
        None
    };
    match doc_type {
        Some(doc_type) if doc_type.has_fields() => form_node(link, &doc_type, &url, ctx),
        _ => button_node(link, &url, ctx),
    }
}

fn form_node(
    link: &Link,
    doc_type: &DocType,
    url: &str,
    ctx: &mut RenderContext,
) -> Result<Node, RenderError> {
    let form_id = ctx.next_id("form");
    let mut div = Node::el("div", &[]);
    let form = div.add_el("form", &[("id", &form_id)]);
    form.add_el("header", &[]).add_text(&link.rel);

    let mut specs = Vec::with_capacity(doc_type.fields.len());
    for field in &doc_type.fields {
        let input_id = format!("{}-{}", form_id, field.name);
        let row = form.add_el("p", &[]);
        row.add_el("label", &[("for", &input_id)]).add_text(&field.name);
        row.add_node(input_node(field, &input_id));

        let kind = input_kind(&field.doc_type);
        specs.push(FieldSpec {
            name: &field.name,
            kind,
            elem: (kind == "list")
                .then(|| field.doc_type.elem.as_deref().map(input_kind))
                .flatten(),
        });
    }
    form.add_el("input", &[("type", "submit"), ("value", &link.rel)]);

    let script = render_script(
        FORM_SCRIPT,
        &[
            ("form_id", script_value(&form_id)?),
            ("fields", script_value(&specs)?),
            ("method", script_value(&link.method.as_str())?),
            ("url", script_value(&url)?),
        ],
    )?;
    div.add_el("script", &[]).add_text(script);
    Ok(div)
}

fn button_node(link: &Link, url: &str, ctx: &mut RenderContext) -> Result<Node, RenderError> {
    let button_id = ctx.next_id("button");
    let mut div = Node::el("div", &[]);
    div.add_el("button", &[("id", &button_id)]).add_text(&link.rel);
    let script = render_script(
        BUTTON_SCRIPT,
        &[
            ("button_id", script_value(&button_id)?),
            ("method", script_value(&link.method.as_str())?),
            ("url", script_value(&url)?),
        ],
    )?;
    div.add_el("script", &[]).add_text(script);
    Ok(div)
}
