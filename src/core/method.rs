//! Resource methods and their HTTP verbs

use axum::http::Method as HttpMethod;
use std::fmt;

/// One of the four handler slots a resource can bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Create,
    Update,
    Delete,
    Load,
}

impl Method {
    /// All methods in binding order
    pub const ALL: [Method; 4] = [Method::Create, Method::Update, Method::Delete, Method::Load];

    /// The name used in route names (`User.Create`)
    pub fn name(&self) -> &'static str {
        match self {
            Method::Create => "Create",
            Method::Update => "Update",
            Method::Delete => "Delete",
            Method::Load => "Load",
        }
    }

    /// The HTTP verb this method is served under
    pub fn http_method(&self) -> HttpMethod {
        match self {
            Method::Create => HttpMethod::POST,
            Method::Update => HttpMethod::PUT,
            Method::Delete => HttpMethod::DELETE,
            Method::Load => HttpMethod::GET,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `method` is a read context (field visibility is opt-out)
pub fn is_read(method: &HttpMethod) -> bool {
    method == HttpMethod::GET || method == HttpMethod::HEAD
}

/// Whether requests with `method` carry a body whose fields are filtered
pub fn has_body(method: &HttpMethod) -> bool {
    method == HttpMethod::POST || method == HttpMethod::PUT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_methods() {
        assert_eq!(Method::Create.http_method(), HttpMethod::POST);
        assert_eq!(Method::Update.http_method(), HttpMethod::PUT);
        assert_eq!(Method::Delete.http_method(), HttpMethod::DELETE);
        assert_eq!(Method::Load.http_method(), HttpMethod::GET);
    }

    #[test]
    fn test_display_matches_route_suffix() {
        assert_eq!(Method::Load.to_string(), "Load");
        assert_eq!(format!("User.{}", Method::Create), "User.Create");
    }

    #[test]
    fn test_read_and_body_methods() {
        assert!(is_read(&HttpMethod::GET));
        assert!(!is_read(&HttpMethod::POST));
        assert!(has_body(&HttpMethod::PUT));
        assert!(!has_body(&HttpMethod::DELETE));
    }
}
