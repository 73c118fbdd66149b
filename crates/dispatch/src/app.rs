use crate::body::{RequestBody, ResponseBody};
use crate::context::{AnyState, Context};
use crate::error::DispatchError;
use crate::handler::{Handler, erase_handler};
use crate::middleware::{Middleware, Pipeline, erase_middleware};
use crate::router::RouteRegistry;
use http::{Method, Request, Response, StatusCode};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// The methods [`App::all`] registers a handler for.
pub const ALL_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// An application: a route registry, a middleware pipeline and one state value.
///
/// Registration takes `&self` and returns `&Self`, so routes can be declared fluently:
///
/// ```
/// use micro_dispatch::{App, handler_fn};
///
/// let app = App::new();
/// app.get("/", handler_fn(|_ctx| async { "hi" }))
///     .post("/echo", handler_fn(|mut ctx| async move { ctx.text().await.unwrap_or_default() }));
/// ```
///
/// Cloning an `App` is cheap and yields a handle to the same registry, pipeline and state.
pub struct App<S = ()> {
    routes: Arc<RouteRegistry>,
    pipeline: Arc<Pipeline>,
    state: Arc<S>,
}

impl App<()> {
    /// Creates an application with no routes, no middleware and the unit state.
    pub fn new() -> Self {
        Self { routes: Arc::new(RouteRegistry::new()), pipeline: Arc::new(Pipeline::new()), state: Arc::new(()) }
    }
}

impl Default for App<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for App<S> {
    fn clone(&self) -> Self {
        Self { routes: Arc::clone(&self.routes), pipeline: Arc::clone(&self.pipeline), state: Arc::clone(&self.state) }
    }
}

impl<S> App<S>
where
    S: Send + Sync + 'static,
{
    /// Creates an application sharing this one's routes and middleware, holding `state`.
    ///
    /// Routes and middleware registered later on either application are visible through both.
    /// The two state values are independent of each other. Middleware and handlers registered
    /// on an `App<()>` run under any state; those typed over another state fail with
    /// [`DispatchError::StateMismatch`] when dispatched by an application holding a different
    /// type.
    pub fn with_state<S2>(&self, state: S2) -> App<S2>
    where
        S2: Send + Sync + 'static,
    {
        App { routes: Arc::clone(&self.routes), pipeline: Arc::clone(&self.pipeline), state: Arc::new(state) }
    }

    /// The state value this application hands to every request.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Appends a middleware to the pipeline shared by every application bound to it.
    pub fn middleware<M: Middleware<S> + 'static>(&self, middleware: M) -> &Self {
        self.pipeline.add(erase_middleware(middleware));
        debug!(position = self.pipeline.len(), "register middleware");
        self
    }

    /// Registers `handler` for the exact `(path, method)` pair, replacing any previous handler.
    pub fn route<H: Handler<S> + 'static>(&self, method: Method, path: impl Into<String>, handler: H) -> &Self {
        let path = path.into();
        debug!(method = %method, path = %path, "register route");
        if self.routes.register(method.clone(), path.clone(), erase_handler(handler)) {
            debug!(method = %method, path = %path, "route replaced");
        }
        self
    }

    pub fn get<H: Handler<S> + 'static>(&self, path: impl Into<String>, handler: H) -> &Self {
        self.route(Method::GET, path, handler)
    }

    pub fn post<H: Handler<S> + 'static>(&self, path: impl Into<String>, handler: H) -> &Self {
        self.route(Method::POST, path, handler)
    }

    pub fn put<H: Handler<S> + 'static>(&self, path: impl Into<String>, handler: H) -> &Self {
        self.route(Method::PUT, path, handler)
    }

    pub fn delete<H: Handler<S> + 'static>(&self, path: impl Into<String>, handler: H) -> &Self {
        self.route(Method::DELETE, path, handler)
    }

    /// Registers one handler for GET, POST, PUT and DELETE on `path`.
    pub fn all<H: Handler<S> + 'static>(&self, path: impl Into<String>, handler: H) -> &Self {
        let path = path.into();
        let handler = erase_handler(handler);
        for method in ALL_METHODS {
            debug!(method = %method, path = %path, "register route");
            self.routes.register(method, path.clone(), Arc::clone(&handler));
        }
        self
    }

    /// All registered `(method, path)` pairs, sorted by path then method.
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.routes.routes()
    }

    /// Dispatches one request.
    ///
    /// Every middleware runs first, in order, whether or not a route matches. The handler
    /// registered for the exact request path and method then produces the response; when there
    /// is none the response is `404 Not Found`. Middleware and handler errors are returned as is.
    pub async fn fetch<B>(&self, request: Request<B>) -> Result<Response<ResponseBody>, DispatchError>
    where
        B: Into<RequestBody>,
    {
        let state: Arc<AnyState> = Arc::clone(&self.state) as Arc<AnyState>;
        let ctx = Context::new(request, state);

        let ctx = self.pipeline.run(ctx).await.inspect_err(|e| warn!(cause = %e, "middleware failed"))?;

        let method = ctx.method().clone();
        let path = ctx.path().to_string();

        let Some(handler) = self.routes.lookup(&path, &method) else {
            debug!(method = %method, path = %path, "no route matched");
            return Ok(not_found());
        };

        debug!(method = %method, path = %path, "route matched");
        handler.call_erased(ctx).await.inspect_err(|e| warn!(method = %method, path = %path, cause = %e, "handler failed"))
    }
}

impl<S> fmt::Debug for App<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.routes)
            .field("pipeline", &self.pipeline)
            .field("state", &std::any::type_name::<S>())
            .finish()
    }
}

fn not_found() -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::from("Not Found"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}
