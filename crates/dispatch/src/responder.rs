//! Response handling module that converts handler results into HTTP responses.
//!
//! The [`Responder`] trait defines how a handler's return value becomes a
//! `Response<ResponseBody>`. A `Response` returned by a handler passes through untouched, so a
//! handler that builds its own response gets exactly that response back out of the dispatcher.

use crate::body::ResponseBody;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use mime::Mime;
use serde::Serialize;
use std::convert::Infallible;
use tracing::error;

/// A trait for types that can be converted into HTTP responses.
pub trait Responder {
    fn response_to(self) -> Response<ResponseBody>;
}

/// Pre-built responses pass through, only the body is converted.
impl<B> Responder for Response<B>
where
    B: Into<ResponseBody>,
{
    fn response_to(self) -> Response<ResponseBody> {
        self.map(Into::into)
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn response_to(self) -> Response<ResponseBody> {
        let (status, responder) = self;
        let mut response = responder.response_to();
        *response.status_mut() = status;
        response
    }
}

impl<T: Responder> Responder for (T, StatusCode) {
    fn response_to(self) -> Response<ResponseBody> {
        let (responder, status) = self;
        (status, responder).response_to()
    }
}

/// `None` becomes an empty `200 OK`.
impl<T: Responder> Responder for Option<T> {
    fn response_to(self) -> Response<ResponseBody> {
        match self {
            Some(t) => t.response_to(),
            None => Response::new(ResponseBody::empty()),
        }
    }
}

impl<T: Responder> Responder for Box<T> {
    fn response_to(self) -> Response<ResponseBody> {
        (*self).response_to()
    }
}

impl Responder for () {
    fn response_to(self) -> Response<ResponseBody> {
        Response::new(ResponseBody::empty())
    }
}

impl Responder for &'static str {
    fn response_to(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), &mime::TEXT_PLAIN_UTF_8)
    }
}

impl Responder for String {
    fn response_to(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), &mime::TEXT_PLAIN_UTF_8)
    }
}

impl Responder for Bytes {
    fn response_to(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), &mime::APPLICATION_OCTET_STREAM)
    }
}

impl Responder for Infallible {
    fn response_to(self) -> Response<ResponseBody> {
        match self {}
    }
}

/// Serializes the wrapped value as an `application/json` response.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T: Serialize> Responder for Json<T> {
    fn response_to(self) -> Response<ResponseBody> {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => with_content_type(ResponseBody::from(bytes), &mime::APPLICATION_JSON),
            Err(e) => {
                error!(cause = %e, "serialize json response error");
                (StatusCode::INTERNAL_SERVER_ERROR, ()).response_to()
            }
        }
    }
}

fn with_content_type(body: ResponseBody, content_type: &Mime) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
