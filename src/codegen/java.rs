//! Java client generation
//!
//! For every resource the generator emits a Retrofit `<Type>Service`
//! interface and one class per struct reachable from the resource type (as
//! seen by GET). Shared helper classes (`Link`, `SingleContainer`,
//! `MultiContainer` and, when a countdown field exists, `Countdown`) are
//! emitted once.

use crate::codegen::CodegenError;
use crate::core::doc_type::{DocKind, DocType};
use crate::core::method::Method;
use crate::core::resource::{ListerInfo, ResourceInfo};
use crate::server::route_table::{RouteTable, template_params};
use axum::http::Method as HttpMethod;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use tera::{Context, Tera};

const CLASS_TEMPLATE: &str = r#"package {{ package }};
{% if annotated %}
import com.google.gson.annotations.SerializedName;
{% endif %}
public class {{ name }} {
{% for field in fields %}{% if field.annotated %}  @SerializedName({{ field.wire }})
{% endif %}  public {{ field.java_type }} {{ field.ident }};
{% endfor %}}
"#;

const SERVICE_TEMPLATE: &str = r#"package {{ package }};

import retrofit2.http.*;
import rx.*;

public interface {{ name }}Service {
{% for method in methods %}
  @{{ method.verb }}({{ method.path }})
  {{ method.signature }};
{% endfor %}}
"#;

const LINK_TEMPLATE: &str = r#"package {{ package }};

public class Link {
  public String Rel;
  public String URL;
  public String Method;
}
"#;

const SINGLE_CONTAINER_TEMPLATE: &str = r#"package {{ package }};

public class SingleContainer<T> {
  public String Name;
  public T Properties;
  public java.util.List<java.util.List<String>> Desc;
  public String Type;
  public java.util.List<Link> Links;
}
"#;

const MULTI_CONTAINER_TEMPLATE: &str = r#"package {{ package }};

public class MultiContainer<T> {
  public String Name;
  public java.util.List<SingleContainer<T>> Properties;
  public java.util.List<java.util.List<String>> Desc;
  public String Type;
  public java.util.List<Link> Links;
}
"#;

const COUNTDOWN_TEMPLATE: &str = r#"package {{ package }};

import com.google.gson.TypeAdapter;
import com.google.gson.annotations.JsonAdapter;
import com.google.gson.stream.JsonReader;
import com.google.gson.stream.JsonWriter;
import java.io.IOException;

/**
 * A duration counting down from the moment it was received.
 */
@JsonAdapter(Countdown.Adapter.class)
public class Countdown {
  public final long nanos;
  public final long receivedAt;

  public Countdown(long nanos, long receivedAt) {
    this.nanos = nanos;
    this.receivedAt = receivedAt;
  }

  public java.util.Date expiresAt() {
    return new java.util.Date(receivedAt + nanos / 1000000L);
  }

  /**
   * Milliseconds left, never negative.
   */
  public long remaining() {
    return Math.max(0L, expiresAt().getTime() - System.currentTimeMillis());
  }

  public static class Adapter extends TypeAdapter<Countdown> {
    @Override
    public void write(JsonWriter out, Countdown value) throws IOException {
      if (value == null) {
        out.nullValue();
        return;
      }
      out.value(value.remaining() * 1000000L);
    }

    @Override
    public Countdown read(JsonReader in) throws IOException {
      return new Countdown(in.nextLong(), System.currentTimeMillis());
    }
  }
}
"#;

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "null", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "void", "volatile", "while",
];

fn non_alnum() -> &'static Regex {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    NON_ALNUM.get_or_init(|| Regex::new("[^a-zA-Z0-9]").unwrap())
}

/// A valid Java identifier for `name`
fn identifier(name: &str) -> String {
    let mut ident = non_alnum().replace_all(name, "_").into_owned();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if JAVA_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Java string literal of `value`
fn literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[derive(Serialize)]
struct FieldView {
    wire: String,
    ident: String,
    annotated: bool,
    java_type: String,
}

#[derive(Serialize)]
struct MethodView {
    verb: String,
    path: String,
    signature: String,
}

/// Accumulates Java sources for a set of resources
#[derive(Debug, Clone)]
pub struct JavaGenerator {
    package: String,
    classes: BTreeMap<String, String>,
    countdown: bool,
}

impl JavaGenerator {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            classes: BTreeMap::new(),
            countdown: false,
        }
    }

    fn render(&self, template: &str, mut context: Context) -> Result<String, CodegenError> {
        context.insert("package", &self.package);
        Ok(Tera::one_off(template, &context, false)?)
    }

    /// Record `source` as class `name`, rejecting a different class under
    /// the same name
    fn insert(&mut self, name: String, source: String) -> Result<(), CodegenError> {
        match self.classes.get(&name) {
            Some(existing) if *existing != source => Err(CodegenError::NameCollision { name }),
            Some(_) => Ok(()),
            None => {
                self.classes.insert(name, source);
                Ok(())
            }
        }
    }

    /// Add the service interface and classes of one resource
    pub fn add_resource(&mut self, info: &ResourceInfo, routes: &RouteTable) -> Result<(), CodegenError> {
        let doc_type = DocType::new(&(info.shape)(), &HttpMethod::GET)?;
        let class_name = self.java_type(&doc_type)?;

        let mut methods = Vec::new();
        for method in [Method::Create, Method::Load, Method::Update, Method::Delete] {
            if !info.methods.contains(&method) {
                continue;
            }
            let route = info.route(method);
            let pattern = routes.path_template(&route)?.to_string();
            let name = lower_first(&identifier(&format!("{}{}", info.type_name, method)));
            let body = matches!(method, Method::Create | Method::Update).then_some(class_name.as_str());
            methods.push(MethodView {
                verb: method.http_method().to_string(),
                path: literal(&pattern),
                signature: signature("SingleContainer", &class_name, &name, body, &pattern, &[]),
            });
        }
        for lister in &info.listers {
            methods.push(Self::lister_method(lister, &class_name));
        }

        let mut context = Context::new();
        context.insert("name", &info.type_name);
        context.insert("methods", &methods);
        let service = self.render(SERVICE_TEMPLATE, context)?;
        self.insert(format!("{}Service", info.type_name), service)?;

        for (name, template) in [
            ("Link", LINK_TEMPLATE),
            ("SingleContainer", SINGLE_CONTAINER_TEMPLATE),
            ("MultiContainer", MULTI_CONTAINER_TEMPLATE),
        ] {
            let source = self.render(template, Context::new())?;
            self.insert(name.to_string(), source)?;
        }
        if self.countdown {
            let source = self.render(COUNTDOWN_TEMPLATE, Context::new())?;
            self.insert("Countdown".to_string(), source)?;
        }
        Ok(())
    }

    fn lister_method(lister: &ListerInfo, class_name: &str) -> MethodView {
        MethodView {
            verb: "GET".to_string(),
            path: literal(&lister.path),
            signature: signature(
                "MultiContainer",
                class_name,
                &lower_first(&identifier(&lister.route)),
                None,
                &lister.path,
                &lister.query_params,
            ),
        }
    }

    /// Java type of `doc_type`, generating classes for structs on the way
    fn java_type(&mut self, doc_type: &DocType) -> Result<String, CodegenError> {
        Ok(match doc_type.kind {
            DocKind::String | DocKind::Key => "String".to_string(),
            DocKind::Bool => "Boolean".to_string(),
            DocKind::Integer | DocKind::Duration => "Long".to_string(),
            DocKind::Number => "Double".to_string(),
            DocKind::Time => "java.util.Date".to_string(),
            DocKind::Countdown => {
                self.countdown = true;
                "Countdown".to_string()
            }
            DocKind::Slice => match doc_type.elem.as_deref() {
                Some(elem) => format!("java.util.List<{}>", self.java_type(elem)?),
                None => "java.util.List<Object>".to_string(),
            },
            DocKind::Map => match doc_type.value.as_deref() {
                Some(value) => format!("java.util.Map<String, {}>", self.java_type(value)?),
                None => "java.util.Map<String, Object>".to_string(),
            },
            DocKind::Struct => {
                self.add_class(doc_type)?;
                identifier(&doc_type.name)
            }
        })
    }

    fn add_class(&mut self, doc_type: &DocType) -> Result<(), CodegenError> {
        let mut fields = Vec::with_capacity(doc_type.fields.len());
        for field in &doc_type.fields {
            let ident = identifier(&field.name);
            fields.push(FieldView {
                annotated: ident != field.name,
                wire: literal(&field.name),
                ident,
                java_type: self.java_type(&field.doc_type)?,
            });
        }
        let mut context = Context::new();
        context.insert("name", &identifier(&doc_type.name));
        context.insert("annotated", &fields.iter().any(|f| f.annotated));
        context.insert("fields", &fields);
        let source = self.render(CLASS_TEMPLATE, context)?;
        self.insert(identifier(&doc_type.name), source)
    }

    /// Generated sources by class name
    pub fn finish(self) -> BTreeMap<String, String> {
        self.classes
    }
}

/// Signature of a service method returning `container<class_name>`
fn signature(
    container: &str,
    class_name: &str,
    name: &str,
    body: Option<&str>,
    pattern: &str,
    query_params: &[String],
) -> String {
    let mut args = Vec::new();
    if let Some(body) = body {
        args.push(format!("@Body {} {}", body, identifier(&lower_first(body))));
    }
    for param in template_params(pattern) {
        args.push(format!("@Path({}) String {}", literal(&param), identifier(&param)));
    }
    for param in query_params {
        args.push(format!("@Query({}) String {}", literal(param), identifier(param)));
    }
    format!(
        "Observable<{}<{}>> {}({})",
        container,
        class_name,
        name,
        args.join(", ")
    )
}

/// Write every class in `classes` to `<dir>/<Name>.java`
pub fn write_to_dir(dir: impl AsRef<Path>, classes: &BTreeMap<String, String>) -> Result<(), CodegenError> {
    let dir = dir.as_ref();
    if !std::fs::metadata(dir)?.is_dir() {
        return Err(CodegenError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    for (name, source) in classes {
        std::fs::write(dir.join(format!("{}.java", name)), source)?;
    }
    tracing::info!("Wrote {} Java classes to {}", classes.len(), dir.display());
    Ok(())
}
