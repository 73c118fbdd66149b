//! Routes whose payload and output types are fixed at compile time.
//!
//! A [`TypedRoute`] ties a method and a path to the payload type its handler receives and the
//! type it must return. Registering it with [`App::typed`] checks the handler signature against
//! the route declaration:
//!
//! ```
//! use http::Method;
//! use micro_dispatch::{App, Context, Json, TypedRoute};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[derive(Serialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! struct CreateUserRoute;
//!
//! impl TypedRoute for CreateUserRoute {
//!     const METHOD: Method = Method::POST;
//!     const PATH: &'static str = "/users";
//!     type Payload = CreateUser;
//!     type Output = Json<User>;
//! }
//!
//! let app = App::new();
//! app.typed::<CreateUserRoute, _, _>(|_ctx: Context, payload: CreateUser| async move {
//!     Json(User { id: 1, name: payload.name })
//! });
//! ```

use crate::app::App;
use crate::body::ResponseBody;
use crate::context::Context;
use crate::error::{BoxError, PayloadError};
use crate::handler::Handler;
use crate::responder::Responder;
use async_trait::async_trait;
use http::{Method, Response};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// Declares a route together with its payload and output types.
pub trait TypedRoute: 'static {
    const METHOD: Method;
    const PATH: &'static str;

    /// Decoded from the query string for `GET`, `HEAD`, `DELETE` and `OPTIONS`, from a json
    /// body otherwise.
    type Payload: DeserializeOwned + Send;

    type Output: Responder;
}

/// Where a route's payload is read from, decided by its method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    Query,
    JsonBody,
}

impl PayloadSource {
    pub fn for_method(method: &Method) -> Self {
        if matches!(method, &Method::GET | &Method::HEAD | &Method::DELETE | &Method::OPTIONS) {
            PayloadSource::Query
        } else {
            PayloadSource::JsonBody
        }
    }
}

/// Decodes the payload of `R` from the request held by `ctx`.
pub async fn extract_payload<R: TypedRoute, S>(ctx: &mut Context<S>) -> Result<R::Payload, PayloadError> {
    match PayloadSource::for_method(&R::METHOD) {
        PayloadSource::Query => ctx.query(),
        PayloadSource::JsonBody => ctx.json().await,
    }
}

/// The handler registered by [`App::typed`].
pub struct TypedHandler<R, F, S> {
    f: F,
    _route: PhantomData<fn(R, S)>,
}

#[async_trait]
impl<R, F, Fut, S> Handler<S> for TypedHandler<R, F, S>
where
    R: TypedRoute,
    S: Send + Sync + 'static,
    F: Fn(Context<S>, R::Payload) -> Fut + Send + Sync,
    Fut: Future<Output = R::Output> + Send,
{
    async fn call(&self, mut ctx: Context<S>) -> Result<Response<ResponseBody>, BoxError> {
        let payload = extract_payload::<R, S>(&mut ctx).await?;
        Ok((self.f)(ctx, payload).await.response_to())
    }
}

impl<R, F, S> fmt::Debug for TypedHandler<R, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedHandler").field("route", &std::any::type_name::<R>()).finish()
    }
}

impl<S> App<S>
where
    S: Send + Sync + 'static,
{
    /// Registers `f` under `R::METHOD` and `R::PATH`.
    ///
    /// A payload that fails to decode is a handler error and propagates out of
    /// [`App::fetch`].
    pub fn typed<R, F, Fut>(&self, f: F) -> &Self
    where
        R: TypedRoute,
        F: Fn(Context<S>, R::Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R::Output> + Send + 'static,
    {
        self.route(R::METHOD, R::PATH, TypedHandler::<R, F, S> { f, _route: PhantomData })
    }
}

#[cfg(test)]
mod tests {
    use super::{PayloadSource, TypedRoute};
    use crate::error::{DispatchError, PayloadError};
    use crate::{App, Context, Json};
    use http::{Method, Request, StatusCode};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize)]
    struct Search {
        q: String,
        page: Option<u32>,
    }

    #[derive(Deserialize)]
    struct NewItem {
        name: String,
    }

    #[derive(Serialize)]
    struct Item {
        id: u32,
        name: String,
    }

    struct SearchRoute;

    impl TypedRoute for SearchRoute {
        const METHOD: Method = Method::GET;
        const PATH: &'static str = "/search";
        type Payload = Search;
        type Output = String;
    }

    struct CreateItemRoute;

    impl TypedRoute for CreateItemRoute {
        const METHOD: Method = Method::POST;
        const PATH: &'static str = "/items";
        type Payload = NewItem;
        type Output = (StatusCode, Json<Item>);
    }

    fn app() -> App {
        let app = App::new();
        app.typed::<SearchRoute, _, _>(|_ctx: Context, search: Search| async move {
            format!("{} page {}", search.q, search.page.unwrap_or(1))
        });
        app.typed::<CreateItemRoute, _, _>(|_ctx: Context, item: NewItem| async move {
            (StatusCode::CREATED, Json(Item { id: 1, name: item.name }))
        });
        app
    }

    #[test]
    fn payload_source_follows_method() {
        assert_eq!(PayloadSource::for_method(&Method::GET), PayloadSource::Query);
        assert_eq!(PayloadSource::for_method(&Method::DELETE), PayloadSource::Query);
        assert_eq!(PayloadSource::for_method(&Method::POST), PayloadSource::JsonBody);
        assert_eq!(PayloadSource::for_method(&Method::PUT), PayloadSource::JsonBody);
    }

    #[tokio::test]
    async fn query_payload() {
        let app = app();
        let response = app.fetch(Request::get("/search?q=rust&page=2").body(()).unwrap()).await.unwrap();
        assert_eq!(response.body().as_bytes(), b"rust page 2");

        assert_eq!(app.routes(), vec![(Method::POST, "/items".to_string()), (Method::GET, "/search".to_string())]);
    }

    #[tokio::test]
    async fn json_payload() {
        let request = Request::post("/items").body(r#"{"name":"book"}"#).unwrap();
        let response = app().fetch(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body().as_bytes(), br#"{"id":1,"name":"book"}"#);
    }

    #[tokio::test]
    async fn malformed_payload_propagates() {
        let request = Request::post("/items").body("not json").unwrap();
        let error = app().fetch(request).await.unwrap_err();

        match error {
            DispatchError::Handler { source } => {
                assert!(matches!(source.downcast_ref::<PayloadError>(), Some(PayloadError::Json { .. })));
            }
            other => panic!("expected handler error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_query_field_propagates() {
        let error = app().fetch(Request::get("/search").body(()).unwrap()).await.unwrap_err();
        assert!(matches!(error, DispatchError::Handler { .. }));
    }
}
