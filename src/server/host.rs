//! Sealed server registry
//!
//! A [`ServerHost`] is what a [`ServerBuilder`](super::ServerBuilder) turns
//! into once registration is over. It exposes the bound routes and resources
//! read-only: URLs can be resolved and client code generated from it, and it
//! becomes an axum `Router` at most once.

use super::builder::RouteBinding;
use super::dispatch::{Filter, Pipeline, PostProc, dispatch};
use super::route_table::RouteTable;
use crate::codegen::{CodegenError, JavaGenerator};
use crate::config::ServerConfig;
use crate::core::error::RouteError;
use crate::core::resource::ResourceInfo;
use crate::html::page::HeadCallback;
use anyhow::{Result, anyhow};
use axum::Router;
use axum::routing::{MethodFilter, MethodRouter};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Registry of everything bound to a server
pub struct ServerHost {
    config: Arc<ServerConfig>,
    routes: Arc<RouteTable>,
    bindings: Vec<RouteBinding>,
    resources: Vec<ResourceInfo>,
    filters: Vec<Filter>,
    post_procs: Vec<PostProc>,
    head_callbacks: Vec<HeadCallback>,
}

impl ServerHost {
    pub(crate) fn new(
        config: ServerConfig,
        routes: RouteTable,
        bindings: Vec<RouteBinding>,
        resources: Vec<ResourceInfo>,
        filters: Vec<Filter>,
        post_procs: Vec<PostProc>,
        head_callbacks: Vec<HeadCallback>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            routes: Arc::new(routes),
            bindings,
            resources,
            filters,
            post_procs,
            head_callbacks,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Named routes in binding order
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Registered resources in registration order
    pub fn resources(&self) -> &[ResourceInfo] {
        &self.resources
    }

    /// Path of route `name` with `params` filled in
    pub fn url(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let params: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.routes.path(name, &params)
    }

    /// Java client code for every registered resource, by class name
    pub fn generate_java(&self) -> Result<BTreeMap<String, String>, CodegenError> {
        let mut generator = JavaGenerator::new(self.config.java_package.clone());
        for resource in &self.resources {
            generator.add_resource(resource, &self.routes)?;
        }
        Ok(generator.finish())
    }

    /// Mount every bound route, plus `custom_routes`, on a router
    pub fn into_router(self, custom_routes: Vec<Router>) -> Result<Router> {
        let pipeline = Arc::new(Pipeline {
            config: self.config.clone(),
            routes: self.routes.clone(),
            filters: self.filters,
            post_procs: self.post_procs,
            head_callbacks: self.head_callbacks,
        });

        // Methods sharing a pattern must share one MethodRouter
        let mut by_pattern: IndexMap<String, MethodRouter> = IndexMap::new();
        for binding in self.bindings {
            let filter = MethodFilter::try_from(binding.method.clone())
                .map_err(|_| anyhow!("{} cannot be routed for {}", binding.method, binding.name))?;
            let pipeline = pipeline.clone();
            let route: Arc<str> = Arc::from(binding.name);
            let handler = binding.handler;
            let endpoint = move |req: axum::extract::Request| {
                dispatch(pipeline.clone(), route.clone(), handler.clone(), req)
            };
            let method_router = by_pattern
                .shift_remove(&binding.pattern)
                .unwrap_or_default()
                .on(filter, endpoint);
            by_pattern.insert(binding.pattern, method_router);
        }

        let mut app = Router::new();
        for (pattern, method_router) in by_pattern {
            app = app.route(&pattern, method_router);
        }
        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        let app = app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
        if self.config.cors {
            return Ok(app.layer(CorsLayer::permissive()));
        }
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::HandlerError;
    use crate::core::request::Request;
    use crate::core::response::ResponseWriter;
    use crate::server::ServerBuilder;
    use axum::http::Method as HttpMethod;

    async fn noop(_w: ResponseWriter, _r: Request) -> Result<(), HandlerError> {
        Ok(())
    }

    fn host() -> ServerHost {
        ServerBuilder::new()
            .handle("Thing.Load", "/Thing/{id}", HttpMethod::GET, noop)
            .unwrap()
            .handle("Thing.Delete", "/Thing/{id}", HttpMethod::DELETE, noop)
            .unwrap()
            .build_host()
    }

    #[test]
    fn test_url() {
        let host = host();
        assert_eq!(host.url("Thing.Load", &[("id", "a b")]).unwrap(), "/Thing/a%20b");
        assert_eq!(
            host.url("Nope", &[]).unwrap_err(),
            RouteError::UnknownRoute("Nope".to_string())
        );
    }

    #[test]
    fn test_into_router_groups_methods() {
        assert!(host().into_router(Vec::new()).is_ok());
    }

    #[test]
    fn test_generate_java_without_resources() {
        assert!(host().generate_java().unwrap().is_empty());
    }
}
