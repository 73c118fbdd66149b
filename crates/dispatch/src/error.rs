use std::error::Error;
use thiserror::Error;

/// Boxed error type returned by user supplied handlers and middleware.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Failures that escape [`App::fetch`](crate::App::fetch).
///
/// An unmatched route is not an error: it is answered with a `404 Not Found` response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("middleware error: {source}")]
    Middleware { source: BoxError },

    #[error("handler error: {source}")]
    Handler { source: BoxError },

    #[error("state type mismatch, expected state of type `{expected}`")]
    StateMismatch { expected: &'static str },
}

impl DispatchError {
    pub fn middleware<E: Into<BoxError>>(e: E) -> Self {
        Self::Middleware { source: e.into() }
    }

    pub fn handler<E: Into<BoxError>>(e: E) -> Self {
        Self::Handler { source: e.into() }
    }

    pub fn state_mismatch<S: ?Sized>() -> Self {
        Self::StateMismatch { expected: std::any::type_name::<S>() }
    }
}

/// Errors raised while reading or decoding a request payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("body has been consumed")]
    BodyConsumed,

    #[error("read body error: {source}")]
    Read { source: BoxError },

    #[error("invalid json payload: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid form payload: {source}")]
    Form {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid query string: {source}")]
    Query {
        #[from]
        source: serde_qs::Error,
    },
}

impl PayloadError {
    pub fn read<E: Into<BoxError>>(e: E) -> Self {
        Self::Read { source: e.into() }
    }
}
