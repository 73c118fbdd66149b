use crate::body::ResponseBody;
use crate::context::{Context, ErasedContext};
use crate::error::{BoxError, DispatchError};
use crate::responder::Responder;
use async_trait::async_trait;
use http::Response;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Produces the final response for one `(path, method)` pair.
///
/// Errors are not turned into responses: they propagate out of
/// [`App::fetch`](crate::App::fetch) to its caller.
#[async_trait]
pub trait Handler<S>: Send + Sync {
    async fn call(&self, ctx: Context<S>) -> Result<Response<ResponseBody>, BoxError>;
}

/// a holder for an async fn whose output is a [`Responder`]
pub struct FnHandler<F, S> {
    f: F,
    _state: PhantomData<fn(S)>,
}

/// a holder for an async fn returning `Result<impl Responder, impl Into<BoxError>>`
pub struct TryFnHandler<F, S> {
    f: F,
    _state: PhantomData<fn(S)>,
}

pub fn handler_fn<S, F, Fut>(f: F) -> FnHandler<F, S>
where
    F: Fn(Context<S>) -> Fut,
{
    FnHandler { f, _state: PhantomData }
}

pub fn try_handler_fn<S, F, Fut>(f: F) -> TryFnHandler<F, S>
where
    F: Fn(Context<S>) -> Fut,
{
    TryFnHandler { f, _state: PhantomData }
}

#[async_trait]
impl<S, F, Fut> Handler<S> for FnHandler<F, S>
where
    S: Send + Sync + 'static,
    F: Fn(Context<S>) -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: Responder,
{
    async fn call(&self, ctx: Context<S>) -> Result<Response<ResponseBody>, BoxError> {
        let responder = (self.f)(ctx).await;
        Ok(responder.response_to())
    }
}

#[async_trait]
impl<S, F, Fut, R, E> Handler<S> for TryFnHandler<F, S>
where
    S: Send + Sync + 'static,
    F: Fn(Context<S>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send,
    R: Responder,
    E: Into<BoxError>,
{
    async fn call(&self, ctx: Context<S>) -> Result<Response<ResponseBody>, BoxError> {
        match (self.f)(ctx).await {
            Ok(responder) => Ok(responder.response_to()),
            Err(e) => Err(e.into()),
        }
    }
}

impl<F, S> fmt::Debug for FnHandler<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("f", &std::any::type_name::<F>()).finish()
    }
}

impl<F, S> fmt::Debug for TryFnHandler<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryFnHandler").field("f", &std::any::type_name::<F>()).finish()
    }
}

pub(crate) type BoxHandler = Arc<dyn ErasedHandler>;

/// A handler whose state type has been erased, so handlers registered through applications
/// with different state types can live in the same registry.
#[async_trait]
pub(crate) trait ErasedHandler: Send + Sync {
    async fn call_erased(&self, ctx: ErasedContext) -> Result<Response<ResponseBody>, DispatchError>;
}

struct StateBound<H, S> {
    handler: H,
    _state: PhantomData<fn() -> S>,
}

pub(crate) fn erase_handler<S, H>(handler: H) -> BoxHandler
where
    S: Send + Sync + 'static,
    H: Handler<S> + 'static,
{
    Arc::new(StateBound { handler, _state: PhantomData })
}

#[async_trait]
impl<S, H> ErasedHandler for StateBound<H, S>
where
    S: Send + Sync + 'static,
    H: Handler<S>,
{
    async fn call_erased(&self, ctx: ErasedContext) -> Result<Response<ResponseBody>, DispatchError> {
        let ctx = ctx.downcast::<S>()?;
        self.handler.call(ctx).await.map_err(DispatchError::handler)
    }
}
