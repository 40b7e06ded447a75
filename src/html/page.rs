//! Full HTML page around rendered content

use crate::config::ServerConfig;
use crate::core::error::RenderError;
use crate::core::item::Content;
use crate::html::node::{Node, RenderContext};
use std::sync::Arc;

/// Hook adding elements to the `<head>` of every HTML page
pub type HeadCallback = Arc<dyn Fn(&mut Node) -> anyhow::Result<()> + Send + Sync>;

/// Built-in page style
pub const DEFAULT_STYLE: &str = r#"
nav > div > form {
  padding: 5pt;
  margin: 0pt;
  border-style: inset;
}
section {
  border-style: outset;
  padding: 5pt;
  margin: 5pt;
}
section > header {
  font-weight: bold;
}
section > article {
  border-style: inset;
  padding: 5pt;
  margin: 5pt;
}
section > article > header {
  font-weight: bold;
}
nav {
  padding: 5pt;
  margin: 5pt;
}
nav > a {
  margin: 5pt;
}
"#;

/// Render `content` as a complete HTML document
pub fn render_page(
    content: &dyn Content,
    head_callbacks: &[HeadCallback],
    config: &ServerConfig,
) -> Result<String, RenderError> {
    let mut ctx = RenderContext::new();
    let body = content.html_node(&mut ctx)?;

    let mut html = Node::el("html", &[]);
    let head = html.add_el("head", &[]);
    head.add_el("meta", &[("charset", "utf-8")]);
    for callback in head_callbacks {
        callback(head).map_err(|e| RenderError::Head(e.to_string()))?;
    }
    for src in &config.head_scripts {
        head.add_el("script", &[("src", src)]);
    }
    head.add_el("style", &[])
        .add_text(config.stylesheet.as_deref().unwrap_or(DEFAULT_STYLE));
    html.add_el("body", &[]).add_node(body);

    let mut out = String::from("<!DOCTYPE html>");
    html.render_into(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    struct Greeting;

    impl Content for Greeting {
        fn html_node(&self, _ctx: &mut RenderContext) -> Result<Node, RenderError> {
            let mut p = Node::el("p", &[]);
            p.add_text("hello");
            Ok(p)
        }

        fn to_json(&self) -> Result<Value, RenderError> {
            Ok(json!("hello"))
        }
    }

    #[test]
    fn test_page_shell() {
        let config = ServerConfig {
            head_scripts: vec!["/app.js".to_string()],
            stylesheet: Some("body {}".to_string()),
            ..Default::default()
        };
        let callback: HeadCallback = Arc::new(|head: &mut Node| {
            head.add_el("title", &[]).add_text("Demo");
            Ok(())
        });
        let page = render_page(&Greeting, &[callback], &config).unwrap();
        assert_eq!(
            page,
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Demo</title>\
             <script src=\"&#x2F;app.js\"></script><style>body {}</style></head>\
             <body><p>hello</p></body></html>"
        );
    }

    #[test]
    fn test_failing_head_callback() {
        let callback: HeadCallback = Arc::new(|_: &mut Node| Err(anyhow::anyhow!("no head")));
        let err = render_page(&Greeting, &[callback], &ServerConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::Head(_)));
    }
}
