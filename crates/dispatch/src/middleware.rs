use crate::context::{Context, ErasedContext};
use crate::error::{BoxError, DispatchError};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// Runs for every request, before routing, in registration order.
///
/// A middleware may read the request and write into the scratch map or the shared state. It
/// cannot answer the request itself; returning an error aborts the dispatch.
#[async_trait]
pub trait Middleware<S>: Send + Sync {
    async fn call(&self, ctx: &mut Context<S>) -> Result<(), BoxError>;
}

pub struct MiddlewareFn<F, S> {
    f: F,
    _state: PhantomData<fn(S)>,
}

/// Wraps a closure returning a boxed future as a [`Middleware`].
///
/// ```
/// use micro_dispatch::{App, middleware_fn};
///
/// let app = App::new();
/// app.middleware(middleware_fn(|ctx| {
///     Box::pin(async move {
///         ctx.scratch_mut().insert("t", 1);
///         Ok(())
///     })
/// }));
/// ```
pub fn middleware_fn<S, F>(f: F) -> MiddlewareFn<F, S>
where
    F: for<'c> Fn(&'c mut Context<S>) -> BoxFuture<'c, Result<(), BoxError>>,
{
    MiddlewareFn { f, _state: PhantomData }
}

#[async_trait]
impl<S, F> Middleware<S> for MiddlewareFn<F, S>
where
    S: Send + Sync + 'static,
    F: for<'c> Fn(&'c mut Context<S>) -> BoxFuture<'c, Result<(), BoxError>> + Send + Sync,
{
    async fn call(&self, ctx: &mut Context<S>) -> Result<(), BoxError> {
        (self.f)(ctx).await
    }
}

impl<F, S> fmt::Debug for MiddlewareFn<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareFn").field("f", &std::any::type_name::<F>()).finish()
    }
}

pub(crate) type BoxMiddleware = Arc<dyn ErasedMiddleware>;

#[async_trait]
pub(crate) trait ErasedMiddleware: Send + Sync {
    async fn call_erased(&self, ctx: ErasedContext) -> Result<ErasedContext, DispatchError>;
}

struct StateBound<M, S> {
    middleware: M,
    _state: PhantomData<fn() -> S>,
}

pub(crate) fn erase_middleware<S, M>(middleware: M) -> BoxMiddleware
where
    S: Send + Sync + 'static,
    M: Middleware<S> + 'static,
{
    Arc::new(StateBound { middleware, _state: PhantomData })
}

#[async_trait]
impl<S, M> ErasedMiddleware for StateBound<M, S>
where
    S: Send + Sync + 'static,
    M: Middleware<S>,
{
    async fn call_erased(&self, ctx: ErasedContext) -> Result<ErasedContext, DispatchError> {
        let state = ctx.state_handle();
        let mut ctx = ctx.downcast::<S>()?;
        self.middleware.call(&mut ctx).await.map_err(DispatchError::middleware)?;
        Ok(ctx.replace_state(state))
    }
}

/// The ordered middleware chain shared by every application bound to it.
///
/// Appending swaps in a new list; a dispatch runs against the list it loaded when it started.
pub(crate) struct Pipeline {
    inner: ArcSwap<Vec<BoxMiddleware>>,
}

impl Pipeline {
    pub(crate) fn new() -> Self {
        Self { inner: ArcSwap::from_pointee(Vec::new()) }
    }

    pub(crate) fn add(&self, middleware: BoxMiddleware) {
        self.inner.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&middleware));
            next
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// Runs every middleware in order, each one awaited before the next begins.
    pub(crate) async fn run(&self, mut ctx: ErasedContext) -> Result<ErasedContext, DispatchError> {
        let middlewares = self.inner.load_full();
        for (index, middleware) in middlewares.iter().enumerate() {
            trace!(index, "run middleware");
            ctx = middleware.call_erased(ctx).await?;
        }
        Ok(ctx)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Pipeline, erase_middleware, middleware_fn};
    use crate::context::{AnyState, Context, ErasedContext};
    use crate::error::{BoxError, DispatchError};
    use http::Request;
    use std::sync::Arc;

    fn erased_context() -> ErasedContext {
        let state: Arc<AnyState> = Arc::new(());
        Context::new(Request::get("/").body(()).unwrap(), state)
    }

    fn push_step(pipeline: &Pipeline, step: &'static str) {
        pipeline.add(erase_middleware::<(), _>(middleware_fn(move |ctx: &mut Context| {
            Box::pin(async move {
                let mut steps = ctx.scratch_mut().remove::<Vec<&'static str>>("steps").unwrap_or_default();
                steps.push(step);
                ctx.scratch_mut().insert("steps", steps);
                Ok(())
            })
        })));
    }

    #[tokio::test]
    async fn runs_in_registration_order() {
        let pipeline = Pipeline::new();
        push_step(&pipeline, "first");
        push_step(&pipeline, "second");
        push_step(&pipeline, "third");
        assert_eq!(pipeline.len(), 3);

        let ctx = pipeline.run(erased_context()).await.unwrap();
        assert_eq!(ctx.scratch().get::<Vec<&'static str>>("steps"), Some(&vec!["first", "second", "third"]));
    }

    #[tokio::test]
    async fn empty_pipeline_passes_context_through() {
        let pipeline = Pipeline::new();
        let ctx = pipeline.run(erased_context()).await.unwrap();
        assert!(ctx.scratch().is_empty());
    }

    #[tokio::test]
    async fn error_stops_the_chain() {
        let pipeline = Pipeline::new();
        push_step(&pipeline, "first");
        pipeline.add(erase_middleware::<(), _>(middleware_fn(|_ctx: &mut Context| {
            Box::pin(async { Err(BoxError::from("unauthorized")) })
        })));
        push_step(&pipeline, "never");

        let result = pipeline.run(erased_context()).await;
        match result {
            Err(DispatchError::Middleware { source }) => assert_eq!(source.to_string(), "unauthorized"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
