//! Named route table
//!
//! Every bound route has a name (`User.Load`, `ListAllUsers`, ...), a path
//! pattern with `{param}` placeholders and an HTTP method. Links refer to
//! routes by name and resolve them to URLs through this table.

use crate::core::error::RouteError;
use axum::http::Method as HttpMethod;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// One registered route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub name: String,
    pub pattern: String,
    pub method: HttpMethod,
}

/// Routes by name, in registration order
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: IndexMap<String, RouteEntry>,
}

fn param_regex() -> &'static Regex {
    static PARAM: OnceLock<Regex> = OnceLock::new();
    PARAM.get_or_init(|| Regex::new(r"\{([^}]+)\}").unwrap())
}

/// Placeholder names of a path pattern, in order
pub fn template_params(pattern: &str) -> Vec<String> {
    param_regex()
        .captures_iter(pattern)
        .map(|c| c[1].to_string())
        .collect()
}

/// Pattern with placeholder names erased, so `/User/{id}` and
/// `/User/{user_id}` compare equal
pub fn normalize_pattern(pattern: &str) -> String {
    param_regex().replace_all(pattern, "{}").into_owned()
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
        method: HttpMethod,
    ) -> Result<(), RouteError> {
        let name = name.into();
        if self.routes.contains_key(&name) {
            return Err(RouteError::Duplicate(name));
        }
        self.routes.insert(
            name.clone(),
            RouteEntry {
                name,
                pattern: pattern.into(),
                method,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.routes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The path pattern of route `name`
    pub fn path_template(&self, name: &str) -> Result<&str, RouteError> {
        self.get(name)
            .map(|r| r.pattern.as_str())
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))
    }

    /// Absolute URL of route `name` on `scheme://host`, with placeholders
    /// replaced by `params`
    pub fn url(
        &self,
        name: &str,
        params: &[(String, String)],
        scheme: &str,
        host: &str,
    ) -> Result<Url, RouteError> {
        let pattern = self.path_template(name)?;
        let base = format!("{}://{}", scheme, host);
        let mut url = Url::parse(&base).map_err(|_| RouteError::InvalidBase(base.clone()))?;

        let mut segments = Vec::new();
        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            let mut missing = None;
            let filled = param_regex().replace_all(segment, |c: &regex::Captures| {
                match params.iter().find(|(k, _)| k == &c[1]) {
                    Some((_, v)) => v.clone(),
                    None => {
                        missing = Some(c[1].to_string());
                        String::new()
                    }
                }
            });
            if let Some(param) = missing {
                return Err(RouteError::MissingParam {
                    route: name.to_string(),
                    param,
                });
            }
            segments.push(filled.into_owned());
        }

        url.path_segments_mut()
            .map_err(|_| RouteError::InvalidBase(base))?
            .clear()
            .extend(&segments);
        Ok(url)
    }

    /// Host-relative path of route `name`
    pub fn path(&self, name: &str, params: &[(String, String)]) -> Result<String, RouteError> {
        let url = self.url(name, params, "http", "localhost")?;
        Ok(url.path().to_string())
    }
}
