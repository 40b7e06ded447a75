//! ServerBuilder for fluent API to build HTTP servers

use super::dispatch::{Filter, PostProc};
use super::host::ServerHost;
use super::route_table::{RouteTable, normalize_pattern};
use crate::config::ServerConfig;
use crate::core::describe::Describe;
use crate::core::doc_type::DocType;
use crate::core::error::{BindError, HandlerError};
use crate::core::item::Itemer;
use crate::core::request::Request;
use crate::core::resource::{Resource, ResourceInfo, RouteHandler, content_handler};
use crate::core::response::ResponseWriter;
use crate::html::node::Node;
use crate::html::page::HeadCallback;
use anyhow::Result;
use axum::Router;
use axum::http::Method as HttpMethod;
use futures::future::BoxFuture;
use std::any::TypeId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// A route ready to be mounted
pub(crate) struct RouteBinding {
    pub name: String,
    pub pattern: String,
    pub method: HttpMethod,
    pub handler: Arc<dyn RouteHandler>,
}

/// Builder for creating HTTP servers from resources
///
/// Registration happens here, single threaded; [`build_host`](Self::build_host)
/// consumes the builder, so nothing can be registered once serving starts.
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .register_resource(Resource::<User>::new().load(load_user).create(create_user))?
///     .add_filter(authenticate)
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: ServerConfig,
    routes: RouteTable,
    bindings: Vec<RouteBinding>,
    resources: Vec<ResourceInfo>,
    resource_types: HashMap<String, (TypeId, &'static str)>,
    filters: Vec<Filter>,
    post_procs: Vec<PostProc>,
    head_callbacks: Vec<HeadCallback>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            routes: RouteTable::new(),
            bindings: Vec::new(),
            resources: Vec::new(),
            resource_types: HashMap::new(),
            filters: Vec::new(),
            post_procs: Vec::new(),
            head_callbacks: Vec::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Replace the server configuration
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add plain axum routes, served outside the resource pipeline
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Register a resource
    ///
    /// This will:
    /// 1. Check that the resource name is not bound to another Rust type
    /// 2. Describe the resource type for GET and every bound method
    /// 3. Bind `TypeName.Method` routes under the create and full paths
    /// 4. Bind the resource's listers
    pub fn register_resource<T: Itemer + Describe>(mut self, resource: Resource<T>) -> Result<Self, BindError> {
        let type_name = Resource::<T>::type_name();
        let rust_type = (TypeId::of::<T>(), std::any::type_name::<T>());
        if let Some((id, expected)) = self.resource_types.get(&type_name) {
            if *id != rust_type.0 {
                return Err(BindError::TypeMismatch {
                    resource: type_name,
                    expected: *expected,
                    found: rust_type.1,
                });
            }
        }

        let mut methods = vec![HttpMethod::GET];
        methods.extend(resource.methods().iter().map(|m| m.http_method()));
        for method in methods {
            DocType::of::<T>(&method).map_err(|source| BindError::Schema {
                resource: type_name.clone(),
                method: method.to_string(),
                source,
            })?;
        }

        for method in resource.methods() {
            if let Some(handler) = resource.handler(method) {
                self.bind(
                    Resource::<T>::route(method),
                    resource.pattern(method),
                    method.http_method(),
                    content_handler(handler),
                )?;
            }
        }
        for lister in resource.listers() {
            self.bind(
                lister.route.clone(),
                lister.path.clone(),
                HttpMethod::GET,
                lister.handler.clone(),
            )?;
        }

        tracing::info!("Registered resource {}", type_name);
        self.resources.push(resource.info());
        self.resource_types.insert(type_name, rust_type);
        Ok(self)
    }

    /// Bind a custom named route
    ///
    /// The handler attaches its own content (or writes a raw body); links
    /// can point at the route by `name`.
    pub fn handle(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
        method: HttpMethod,
        handler: impl RouteHandler,
    ) -> Result<Self, BindError> {
        self.bind(name.into(), pattern.into(), method, Arc::new(handler))?;
        Ok(self)
    }

    fn bind(
        &mut self,
        name: String,
        pattern: String,
        method: HttpMethod,
        handler: Arc<dyn RouteHandler>,
    ) -> Result<(), BindError> {
        if self.routes.get(&name).is_some() {
            return Err(BindError::DuplicateRoute(name));
        }
        let normalized = normalize_pattern(&pattern);
        let overlaps = self.routes.iter().any(|entry| {
            normalize_pattern(&entry.pattern) == normalized
                && (entry.pattern != pattern || entry.method == method)
        });
        if overlaps {
            return Err(BindError::OverlappingRoute {
                pattern,
                method: method.to_string(),
            });
        }
        self.routes
            .register(name.clone(), pattern.clone(), method.clone())
            .map_err(|_| BindError::DuplicateRoute(name.clone()))?;

        tracing::info!("Bound {} {} as {}", method, pattern, name);
        self.bindings.push(RouteBinding {
            name,
            pattern,
            method,
            handler,
        });
        Ok(())
    }

    /// Add a filter run before every handler
    ///
    /// Returning `Ok(false)` stops processing and sends whatever the filter
    /// wrote; an error is sent as the response.
    pub fn add_filter<F, Fut>(mut self, filter: F) -> Self
    where
        F: Fn(ResponseWriter, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, HandlerError>> + Send + 'static,
    {
        self.filters.push(Arc::new(
            move |w: ResponseWriter, r: Request| -> BoxFuture<'static, Result<bool, HandlerError>> {
                Box::pin(filter(w, r))
            },
        ));
        self
    }

    /// Add a post-processor run after every handler
    ///
    /// It receives the handler's error (or the previous post-processor's) and
    /// returns whether to continue along with the error to keep.
    pub fn add_post_proc<F, Fut>(mut self, post_proc: F) -> Self
    where
        F: Fn(ResponseWriter, Request, Option<HandlerError>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = (bool, Option<HandlerError>)> + Send + 'static,
    {
        self.post_procs.push(Arc::new(
            move |w: ResponseWriter,
                  r: Request,
                  e: Option<HandlerError>|
                  -> BoxFuture<'static, (bool, Option<HandlerError>)> {
                Box::pin(post_proc(w, r, e))
            },
        ));
        self
    }

    /// Add a callback mutating the `<head>` of every HTML page
    pub fn head_callback(
        mut self,
        callback: impl Fn(&mut Node) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.head_callbacks.push(Arc::new(callback));
        self
    }

    /// Seal the registration phase
    pub fn build_host(self) -> ServerHost {
        ServerHost::new(
            self.config,
            self.routes,
            self.bindings,
            self.resources,
            self.filters,
            self.post_procs,
            self.head_callbacks,
        )
    }

    /// Build the final router
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        self.build_host().into_router(custom_routes)
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::new()
    ///     .register_resource(users)?
    ///     .serve("127.0.0.1:8080").await?;
    /// ```
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::Item;
    use crate::core::method::Method;
    use crate::core::resource::Lister;
    use crate::impl_describe;
    use serde::Serialize;

    // === Fixtures ===

    #[derive(Serialize)]
    struct Car {
        #[serde(rename = "Model")]
        model: String,
    }

    impl_describe!(Car { "Model": String [POST, PUT] });

    impl Itemer for Car {
        fn item(&self, _r: &Request) -> Item {
            Item::new(self)
        }
    }

    mod impostor {
        use super::*;

        #[derive(Serialize)]
        pub struct Car;

        impl_describe!(Car {});

        impl Itemer for Car {
            fn item(&self, _r: &Request) -> Item {
                Item::new(self)
            }
        }
    }

    struct Looped;
    impl_describe!(Looped { "Next": Vec<Looped> });

    impl Itemer for Looped {
        fn item(&self, _r: &Request) -> Item {
            Item::list(Vec::new())
        }
    }

    async fn load_car(_w: ResponseWriter, _r: Request) -> Result<Option<Car>, HandlerError> {
        Ok(None)
    }

    async fn load_impostor(_w: ResponseWriter, _r: Request) -> Result<Option<impostor::Car>, HandlerError> {
        Ok(None)
    }

    async fn load_looped(_w: ResponseWriter, _r: Request) -> Result<Option<Looped>, HandlerError> {
        Ok(None)
    }

    async fn list(_w: ResponseWriter, _r: Request) -> Result<(), HandlerError> {
        Ok(())
    }

    // === Registration ===

    #[test]
    fn test_register_resource_binds_routes() {
        let host = ServerBuilder::new()
            .register_resource(
                Resource::<Car>::new()
                    .create(load_car)
                    .load(load_car)
                    .lister(Lister::new("ListCars", "/Cars", list)),
            )
            .unwrap()
            .build_host();

        let routes: Vec<_> = host
            .routes()
            .iter()
            .map(|r| (r.name.as_str(), r.pattern.as_str(), r.method.clone()))
            .collect();
        assert_eq!(
            routes,
            vec![
                ("Car.Create", "/Car", HttpMethod::POST),
                ("Car.Load", "/Car/{id}", HttpMethod::GET),
                ("ListCars", "/Cars", HttpMethod::GET),
            ]
        );
        assert_eq!(host.resources()[0].methods, vec![Method::Create, Method::Load]);
    }

    #[test]
    fn test_same_type_twice_is_a_duplicate_route() {
        let err = ServerBuilder::new()
            .register_resource(Resource::<Car>::new().load(load_car))
            .unwrap()
            .register_resource(Resource::<Car>::new().load(load_car))
            .err()
            .unwrap();
        assert!(matches!(err, BindError::DuplicateRoute(name) if name == "Car.Load"));
    }

    #[test]
    fn test_other_type_with_same_name_is_a_mismatch() {
        let err = ServerBuilder::new()
            .register_resource(Resource::<Car>::new().load(load_car))
            .unwrap()
            .register_resource(Resource::<impostor::Car>::new().load(load_impostor))
            .err()
            .unwrap();
        assert!(matches!(err, BindError::TypeMismatch { .. }));
    }

    #[test]
    fn test_undescribable_type_is_rejected() {
        let err = ServerBuilder::new()
            .register_resource(Resource::<Looped>::new().load(load_looped))
            .err()
            .unwrap();
        assert!(matches!(err, BindError::Schema { method, .. } if method == "GET"));
    }

    #[test]
    fn test_overlapping_patterns_are_rejected() {
        let err = ServerBuilder::new()
            .register_resource(Resource::<Car>::new().load(load_car))
            .unwrap()
            .handle("CarByPlate", "/Car/{plate}", HttpMethod::PUT, list)
            .err()
            .unwrap();
        assert!(matches!(err, BindError::OverlappingRoute { .. }));

        let err = ServerBuilder::new()
            .handle("A", "/a", HttpMethod::GET, list)
            .unwrap()
            .handle("B", "/a", HttpMethod::GET, list)
            .err()
            .unwrap();
        assert!(matches!(err, BindError::OverlappingRoute { .. }));
    }

    #[test]
    fn test_same_pattern_other_method_is_allowed() {
        let host = ServerBuilder::new()
            .handle("A", "/a/{id}", HttpMethod::GET, list)
            .unwrap()
            .handle("B", "/a/{id}", HttpMethod::DELETE, list)
            .unwrap()
            .build_host();
        assert_eq!(host.routes().len(), 2);
    }
}
