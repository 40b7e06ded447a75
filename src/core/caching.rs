//! Version-keyed conditional responses
//!
//! Content that only changes between deployments can be wrapped with
//! [`etag_cached`]. The wrapper derives a weak ETag from the deployment
//! version and the negotiated media type and charset, and answers a matching
//! `If-None-Match` with `304 Not Modified` without running the handler.

use crate::core::error::HandlerError;
use crate::core::request::Request;
use crate::core::response::ResponseWriter;
use axum::http::header::{ETAG, IF_NONE_MATCH};
use axum::http::{HeaderValue, StatusCode};
use futures::future::BoxFuture;
use std::future::Future;

/// Weak ETag for `version` in the negotiated representation of `r`
pub fn version_etag(version: &str, r: &Request) -> String {
    let digest = blake3::hash(
        format!(
            "version:{},media:{},charset:{}",
            version,
            r.media(),
            r.charset()
        )
        .as_bytes(),
    );
    format!("W/\"{}\"", digest.to_hex())
}

fn matches_etag(r: &Request, etag: &str) -> bool {
    r.headers()
        .get_all(IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate == etag)
}

/// Wrap `handler` so it is skipped when the client already holds the
/// representation for `version`
///
/// Works for resource handlers (`O = Option<T>`) and route handlers
/// (`O = ()`) alike; a skipped handler yields `O::default()`.
pub fn etag_cached<F, Fut, O>(
    version: impl Into<String>,
    handler: F,
) -> impl Fn(ResponseWriter, Request) -> BoxFuture<'static, Result<O, HandlerError>> + Send + Sync + 'static
where
    F: Fn(ResponseWriter, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, HandlerError>> + Send + 'static,
    O: Default + Send + 'static,
{
    let version: String = version.into();
    move |w: ResponseWriter, r: Request| -> BoxFuture<'static, Result<O, HandlerError>> {
        let etag = version_etag(&version, &r);
        if matches_etag(&r, &etag) {
            tracing::debug!(%etag, "not modified");
            w.set_status(StatusCode::NOT_MODIFIED);
            return Box::pin(async { Ok(O::default()) });
        }
        if let Ok(value) = HeaderValue::from_str(&etag) {
            w.insert_header(ETAG, value);
        }
        Box::pin(handler(w, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::request::tests::request;
    use crate::core::resource::RouteHandler;
    use crate::server::route_table::RouteTable;
    use axum::http::Method as HttpMethod;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(calls: Arc<AtomicUsize>) -> impl RouteHandler {
        etag_cached("v1", move |_w: ResponseWriter, _r: Request| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_sets_etag_and_runs_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = counting(calls.clone());
        let r = request(HttpMethod::GET, "/", &[], "", RouteTable::new());
        let w = ResponseWriter::new();
        handler.call(w.clone(), r.clone()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let etag = w.header(&ETAG).unwrap();
        assert_eq!(etag.to_str().unwrap(), version_etag("v1", &r));
        assert!(etag.to_str().unwrap().starts_with("W/\""));
        assert_eq!(w.status(), None);
    }

    #[tokio::test]
    async fn test_matching_if_none_match_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = counting(calls.clone());
        let probe = request(HttpMethod::GET, "/", &[], "", RouteTable::new());
        let etag = version_etag("v1", &probe);
        let header = format!("W/\"other\", {}", etag);

        let r = request(HttpMethod::GET, "/", &[("if-none-match", header.as_str())], "", RouteTable::new());
        let w = ResponseWriter::new();
        handler.call(w.clone(), r).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(w.status(), Some(StatusCode::NOT_MODIFIED));
    }

    #[tokio::test]
    async fn test_stale_etag_runs_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = counting(calls.clone());
        let r = request(HttpMethod::GET, "/", &[("if-none-match", "W/\"stale\"")], "", RouteTable::new());
        handler.call(ResponseWriter::new(), r).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_etag_depends_on_version() {
        let r = request(HttpMethod::GET, "/", &[], "", RouteTable::new());
        assert_ne!(version_etag("v1", &r), version_etag("v2", &r));
    }
}
