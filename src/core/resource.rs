//! Resource method binding
//!
//! A [`Resource`] groups up to four handlers (Create, Update, Delete, Load)
//! for one described type, plus any number of [`Lister`] routes. Handler
//! shapes are checked by the compiler: every slot takes a [`ResponseWriter`]
//! and a [`Request`] and resolves to `Result<Option<T>, HandlerError>`.
//!
//! ```rust,ignore
//! let users = Resource::<User>::new()
//!     .load(load_user)
//!     .create(create_user)
//!     .lister(Lister::new("Users.List", "/Users", list_users).query_param("name"));
//! ```

use crate::core::describe::{Describe, ShapeFn};
use crate::core::error::HandlerError;
use crate::core::item::Itemer;
use crate::core::link::Link;
use crate::core::method::Method;
use crate::core::request::Request;
use crate::core::response::ResponseWriter;
use futures::future::BoxFuture;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// A resource method handler producing an optional `T`
pub trait Handler<T>: Send + Sync + 'static {
    fn call(&self, w: ResponseWriter, r: Request) -> BoxFuture<'static, Result<Option<T>, HandlerError>>;
}

impl<F, Fut, T> Handler<T> for F
where
    F: Fn(ResponseWriter, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<T>, HandlerError>> + Send + 'static,
{
    fn call(&self, w: ResponseWriter, r: Request) -> BoxFuture<'static, Result<Option<T>, HandlerError>> {
        Box::pin(self(w, r))
    }
}

/// A handler that writes its own response content
///
/// Used for listers and for custom routes registered with
/// [`ServerBuilder::handle`](crate::server::ServerBuilder::handle).
pub trait RouteHandler: Send + Sync + 'static {
    fn call(&self, w: ResponseWriter, r: Request) -> BoxFuture<'static, Result<(), HandlerError>>;
}

impl<F, Fut> RouteHandler for F
where
    F: Fn(ResponseWriter, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn call(&self, w: ResponseWriter, r: Request) -> BoxFuture<'static, Result<(), HandlerError>> {
        Box::pin(self(w, r))
    }
}

/// Adapt a resource handler into a route handler that sets the returned
/// value's item as response content
pub(crate) fn content_handler<T: Itemer>(handler: Arc<dyn Handler<T>>) -> Arc<dyn RouteHandler> {
    Arc::new(move |w: ResponseWriter, r: Request| {
        let handler = handler.clone();
        async move {
            if let Some(value) = handler.call(w.clone(), r.clone()).await? {
                w.set_content(value.item(&r));
            }
            Ok(())
        }
    })
}

/// A named GET route listing resources
#[derive(Clone)]
pub struct Lister {
    pub route: String,
    pub path: String,
    /// Query parameters the handler understands, used for client code only
    pub query_params: Vec<String>,
    pub handler: Arc<dyn RouteHandler>,
}

impl Lister {
    pub fn new(route: impl Into<String>, path: impl Into<String>, handler: impl RouteHandler) -> Self {
        Self {
            route: route.into(),
            path: path.into(),
            query_params: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn query_param(mut self, name: impl Into<String>) -> Self {
        self.query_params.push(name.into());
        self
    }
}

/// Handlers for one resource type
pub struct Resource<T> {
    create: Option<Arc<dyn Handler<T>>>,
    update: Option<Arc<dyn Handler<T>>>,
    delete: Option<Arc<dyn Handler<T>>>,
    load: Option<Arc<dyn Handler<T>>>,
    listers: Vec<Lister>,
    create_path: Option<String>,
    full_path: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Itemer + Describe> Default for Resource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Itemer + Describe> Resource<T> {
    pub fn new() -> Self {
        Self {
            create: None,
            update: None,
            delete: None,
            load: None,
            listers: Vec::new(),
            create_path: None,
            full_path: None,
            _marker: PhantomData,
        }
    }

    pub fn create(mut self, handler: impl Handler<T>) -> Self {
        self.create = Some(Arc::new(handler));
        self
    }

    pub fn update(mut self, handler: impl Handler<T>) -> Self {
        self.update = Some(Arc::new(handler));
        self
    }

    pub fn delete(mut self, handler: impl Handler<T>) -> Self {
        self.delete = Some(Arc::new(handler));
        self
    }

    pub fn load(mut self, handler: impl Handler<T>) -> Self {
        self.load = Some(Arc::new(handler));
        self
    }

    pub fn lister(mut self, lister: Lister) -> Self {
        self.listers.push(lister);
        self
    }

    /// Override the collection path (default `/TypeName`)
    pub fn create_path(mut self, path: impl Into<String>) -> Self {
        self.create_path = Some(path.into());
        self
    }

    /// Override the entity path (default `{create_path}/{id}`)
    pub fn full_path(mut self, path: impl Into<String>) -> Self {
        self.full_path = Some(path.into());
        self
    }

    /// Name of the resource type
    pub fn type_name() -> String {
        T::shape().name()
    }

    /// Route name of `method`, such as `User.Load`
    pub fn route(method: Method) -> String {
        format!("{}.{}", Self::type_name(), method)
    }

    /// A link to `method` of this resource, carrying the resource type
    pub fn link(rel: &str, method: Method, params: &[(&str, &str)]) -> Link {
        params.iter().fold(
            Link::new(rel, Self::route(method))
                .with_method(method.http_method())
                .with_type::<T>(),
            |link, (name, value)| link.with_param(*name, *value),
        )
    }

    pub fn create_pattern(&self) -> String {
        self.create_path
            .clone()
            .unwrap_or_else(|| format!("/{}", Self::type_name()))
    }

    pub fn full_pattern(&self) -> String {
        self.full_path
            .clone()
            .unwrap_or_else(|| format!("{}/{{id}}", self.create_pattern()))
    }

    /// Path pattern `method` is served under
    pub fn pattern(&self, method: Method) -> String {
        match method {
            Method::Create => self.create_pattern(),
            _ => self.full_pattern(),
        }
    }

    pub fn handler(&self, method: Method) -> Option<Arc<dyn Handler<T>>> {
        match method {
            Method::Create => self.create.clone(),
            Method::Update => self.update.clone(),
            Method::Delete => self.delete.clone(),
            Method::Load => self.load.clone(),
        }
    }

    /// Bound methods in binding order
    pub fn methods(&self) -> Vec<Method> {
        Method::ALL
            .into_iter()
            .filter(|m| self.handler(*m).is_some())
            .collect()
    }

    pub fn listers(&self) -> &[Lister] {
        &self.listers
    }

    /// What code generation needs to know about this resource
    pub fn info(&self) -> ResourceInfo {
        ResourceInfo {
            type_name: Self::type_name(),
            shape: T::shape,
            methods: self.methods(),
            listers: self
                .listers
                .iter()
                .map(|l| ListerInfo {
                    route: l.route.clone(),
                    path: l.path.clone(),
                    query_params: l.query_params.clone(),
                })
                .collect(),
        }
    }
}

/// Handler-free description of a bound resource
#[derive(Debug, Clone)]
pub struct ResourceInfo {
    pub type_name: String,
    pub shape: ShapeFn,
    pub methods: Vec<Method>,
    pub listers: Vec<ListerInfo>,
}

impl ResourceInfo {
    /// Route name of `method`
    pub fn route(&self, method: Method) -> String {
        format!("{}.{}", self.type_name, method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListerInfo {
    pub route: String,
    pub path: String,
    pub query_params: Vec<String>,
}
