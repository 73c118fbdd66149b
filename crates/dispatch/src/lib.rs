//! A minimal asynchronous request dispatcher.
//!
//! An [`App`] holds three things: a route registry mapping an exact path and method to a
//! [`Handler`], an ordered chain of [`Middleware`], and one application state value. A request
//! handed to [`App::fetch`] goes through the following steps:
//!
//! 1. a fresh [`Context`] is created, carrying the request, an empty [`Scratch`] map and a shared
//!    reference to the state
//! 2. every middleware runs, in registration order, each awaited before the next
//! 3. the handler registered for the request's path and method produces the response
//! 4. when no handler matches, the response is `404 Not Found`
//!
//! ```
//! use http::Request;
//! use micro_dispatch::{App, Context, handler_fn, middleware_fn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let app = App::new();
//! app.middleware(middleware_fn(|ctx: &mut Context| {
//!     Box::pin(async move {
//!         ctx.scratch_mut().insert("t", 1);
//!         Ok(())
//!     })
//! }));
//! app.get("/", handler_fn(|_ctx: Context| async { "hi" }));
//!
//! let response = app.fetch(Request::get("/").body(()).unwrap()).await.unwrap();
//! assert_eq!(response.body().as_bytes(), b"hi");
//!
//! let response = app.fetch(Request::get("/missing").body(()).unwrap()).await.unwrap();
//! assert_eq!(response.status(), 404);
//! # }
//! ```
//!
//! # State
//!
//! [`App::with_state`] creates a second application bound to the same routes and middleware but
//! holding its own state value. The state is shared by every request in flight through
//! `Arc<S>`; the dispatcher adds no locking around it, so concurrent mutation needs whatever
//! interior mutability the state type provides.
//!
//! # Errors
//!
//! Middleware and handlers may fail. Failures are not recovered: [`App::fetch`] returns them as
//! a [`DispatchError`] and the caller decides how to answer.

mod app;
mod body;
mod context;
mod error;
mod handler;
mod middleware;
mod responder;
mod router;
mod scratch;

pub mod typed;

pub use app::{ALL_METHODS, App};
pub use body::{RequestBody, ResponseBody};
pub use context::Context;
pub use error::{BoxError, DispatchError, PayloadError};
pub use handler::{FnHandler, Handler, TryFnHandler, handler_fn, try_handler_fn};
pub use middleware::{Middleware, MiddlewareFn, middleware_fn};
pub use responder::{Json, Responder};
pub use scratch::Scratch;
pub use typed::TypedRoute;
