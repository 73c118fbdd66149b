//! The per request context handed to middleware and handlers.
//!
//! A [`Context`] bundles three things for the lifetime of one dispatch:
//! - the request itself (head and a body that can be consumed once)
//! - a fresh, empty [`Scratch`] map, used to pass values from middleware to the handler
//! - a shared reference to the application state

use crate::body::RequestBody;
use crate::error::{DispatchError, PayloadError};
use crate::scratch::Scratch;
use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The application state with its concrete type erased, as stored while a request travels
/// between middleware and handlers registered for possibly different state types.
pub(crate) type AnyState = dyn Any + Send + Sync;

pub(crate) type ErasedContext = Context<AnyState>;

/// Everything one dispatch carries from the first middleware to the handler.
pub struct Context<S: ?Sized = ()> {
    parts: Parts,
    body: Option<RequestBody>,
    scratch: Scratch,
    state: Arc<S>,
}

impl<S: ?Sized> Context<S> {
    /// Creates a context with an empty scratch map.
    pub fn new<B: Into<RequestBody>>(request: Request<B>, state: Arc<S>) -> Self {
        let (parts, body) = request.into_parts();
        Self { parts, body: Some(body.into()), scratch: Scratch::new(), state }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// The path component of the request uri, without the query string.
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn version(&self) -> Version {
        self.parts.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// The request head, including its extensions.
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }

    /// The application wide state, shared by every request in flight.
    ///
    /// No locking is performed around it; mutation goes through whatever interior mutability
    /// `S` provides.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// A clone of the shared state handle, for work that outlives this context.
    pub fn state_handle(&self) -> Arc<S> {
        Arc::clone(&self.state)
    }

    pub fn can_consume_body(&self) -> bool {
        self.body.is_some()
    }

    /// Takes the request body out of the context, leaving nothing behind.
    pub fn take_body(&mut self) -> Option<RequestBody> {
        self.body.take()
    }

    /// Reads the whole request body. The body can only be read once.
    pub async fn bytes(&mut self) -> Result<Bytes, PayloadError> {
        let body = self.body.take().ok_or(PayloadError::BodyConsumed)?;
        let collected = body.collect().await.map_err(PayloadError::read)?;
        Ok(collected.to_bytes())
    }

    pub async fn text(&mut self) -> Result<String, PayloadError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(PayloadError::read)
    }

    /// Reads the request body and deserializes it as json.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, PayloadError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Reads the request body and deserializes it as `application/x-www-form-urlencoded`.
    pub async fn form<T: DeserializeOwned>(&mut self) -> Result<T, PayloadError> {
        let bytes = self.bytes().await?;
        Ok(serde_urlencoded::from_bytes(&bytes)?)
    }

    /// Deserializes the query string, an absent query string is treated as an empty one.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
        let query = self.parts.uri.query().unwrap_or_default();
        Ok(serde_qs::from_str(query)?)
    }
}

impl ErasedContext {
    /// Recovers the concrete state type.
    ///
    /// A context asked for the unit state always succeeds: middleware and handlers registered
    /// without state run under any application. Any other type must match the state the
    /// application holds.
    pub(crate) fn downcast<S>(self) -> Result<Context<S>, DispatchError>
    where
        S: Send + Sync + 'static,
    {
        let Context { parts, body, scratch, state } = self;
        let state = match state.downcast::<S>() {
            Ok(state) => state,
            Err(_) => {
                let unit: Arc<AnyState> = Arc::new(());
                unit.downcast::<S>().map_err(|_| DispatchError::state_mismatch::<S>())?
            }
        };
        Ok(Context { parts, body, scratch, state })
    }
}

impl<S: ?Sized> Context<S> {
    /// Moves the request and scratch map into a context holding `state`.
    pub(crate) fn replace_state<T: ?Sized>(self, state: Arc<T>) -> Context<T> {
        let Context { parts, body, scratch, .. } = self;
        Context { parts, body, scratch, state }
    }
}

impl<S: ?Sized> fmt::Debug for Context<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.method())
            .field("uri", self.uri())
            .field("scratch", &self.scratch)
            .field("body_consumed", &self.body.is_none())
            .finish_non_exhaustive()
    }
}
