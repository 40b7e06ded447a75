//! Per-route request pipeline
//!
//! Every bound route is served by [`dispatch`]: content negotiation, path
//! variables and body reading, then filters, the handler and post-processors,
//! and finally rendering of whatever content the handler attached.

use crate::config::ServerConfig;
use crate::core::error::{HandlerError, HttpError, RenderError};
use crate::core::item::Content;
use crate::core::media::{Media, negotiate};
use crate::core::request::Request;
use crate::core::resource::RouteHandler;
use crate::core::response::ResponseWriter;
use crate::html::page::{HeadCallback, render_page};
use crate::server::route_table::RouteTable;
use axum::body::to_bytes;
use axum::extract::{FromRequestParts, Path};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// Runs before the handler; `Ok(false)` stops processing
pub type Filter =
    Arc<dyn Fn(ResponseWriter, Request) -> BoxFuture<'static, Result<bool, HandlerError>> + Send + Sync>;

/// Runs after the handler with its error; may replace the error, and
/// returning `false` skips the remaining post-processors
pub type PostProc = Arc<
    dyn Fn(ResponseWriter, Request, Option<HandlerError>) -> BoxFuture<'static, (bool, Option<HandlerError>)>
        + Send
        + Sync,
>;

/// State shared by every route of a server
pub(crate) struct Pipeline {
    pub config: Arc<ServerConfig>,
    pub routes: Arc<RouteTable>,
    pub filters: Vec<Filter>,
    pub post_procs: Vec<PostProc>,
    pub head_callbacks: Vec<HeadCallback>,
}

impl Pipeline {
    fn render(&self, content: &dyn Content, media: Media) -> Result<String, RenderError> {
        match media {
            Media::Json => Ok(serde_json::to_string(&content.to_json()?)?),
            Media::Html => render_page(content, &self.head_callbacks, &self.config),
        }
    }

    /// Turn what the handler wrote into a response
    fn respond(&self, w: &ResponseWriter, r: &Request) -> Response {
        let state = w.take();
        let status = state.status.unwrap_or(StatusCode::OK);
        let mut response = match state.content {
            Some(content) => match self.render(content.as_ref(), r.media()) {
                Ok(body) => (status, [(CONTENT_TYPE, r.media().content_type())], body).into_response(),
                Err(e) => return HandlerError::from(e).into_response(),
            },
            None => (status, state.body.unwrap_or_default()).into_response(),
        };
        response.headers_mut().extend(state.headers);
        response
    }
}

/// Serve one request for the route named `route`
pub(crate) async fn dispatch(
    pipeline: Arc<Pipeline>,
    route: Arc<str>,
    handler: Arc<dyn RouteHandler>,
    req: axum::extract::Request,
) -> Response {
    let (mut parts, body) = req.into_parts();
    tracing::debug!(method = %parts.method, uri = %parts.uri, route = %route, "dispatching request");

    let negotiated = match negotiate(&parts.headers, &parts.uri) {
        Ok(negotiated) => negotiated,
        Err(e) => return e.into_response(),
    };
    let vars = match Path::<HashMap<String, String>>::from_request_parts(&mut parts, &()).await {
        Ok(Path(vars)) => vars,
        Err(_) => HashMap::new(),
    };
    let body = match to_bytes(body, pipeline.config.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            return HttpError::new(
                format!("failed to read request body: {}", e),
                StatusCode::PAYLOAD_TOO_LARGE,
            )
            .into_response();
        }
    };

    let r = Request::new(parts, body, vars, negotiated, pipeline.routes.clone());
    let w = ResponseWriter::new();

    for filter in &pipeline.filters {
        match filter(w.clone(), r.clone()).await {
            Ok(true) => {}
            Ok(false) => return pipeline.respond(&w, &r),
            Err(e) => return e.into_response(),
        }
    }

    let mut error = handler.call(w.clone(), r.clone()).await.err();
    for post_proc in &pipeline.post_procs {
        let (cont, replaced) = post_proc(w.clone(), r.clone(), error.take()).await;
        error = replaced;
        if !cont {
            break;
        }
    }
    if let Some(e) = error {
        return e.into_response();
    }

    pipeline.respond(&w, &r)
}
